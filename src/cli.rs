use std::env;
use std::path::PathBuf;

/// Default API port.
#[cfg(feature = "api")]
pub const DEFAULT_PORT: u16 = 3000;

/// Parsed command-line options.
#[derive(Debug, Default)]
pub struct CliOptions {
    pub session: Option<PathBuf>,
    pub preset: Option<String>,
    pub limits: Option<PathBuf>,
    pub json_out: Option<PathBuf>,
    pub csv_out: Option<PathBuf>,
    pub log_json: bool,
    pub help: bool,
    #[cfg(feature = "api")]
    pub serve: bool,
    #[cfg(feature = "api")]
    pub port: Option<u16>,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    parse_options(&args)
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut opts = CliOptions::default();

    while i < args.len() {
        match args[i].as_str() {
            "--session" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --session (expected a TOML file path)",
                )?;
                if opts.session.replace(PathBuf::from(path)).is_some() {
                    return Err("--session provided more than once".to_string());
                }
            }
            "--preset" => {
                i += 1;
                let name =
                    args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                if opts.preset.replace(name.to_string()).is_some() {
                    return Err("--preset provided more than once".to_string());
                }
            }
            "--limits" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --limits (expected a TOML file path)",
                )?;
                if opts.limits.replace(PathBuf::from(path)).is_some() {
                    return Err("--limits provided more than once".to_string());
                }
            }
            "--json-out" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --json-out (expected a file path)")?;
                if opts.json_out.replace(PathBuf::from(path)).is_some() {
                    return Err("--json-out provided more than once".to_string());
                }
            }
            "--csv-out" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --csv-out (expected a file path)")?;
                if opts.csv_out.replace(PathBuf::from(path)).is_some() {
                    return Err("--csv-out provided more than once".to_string());
                }
            }
            "--log-json" => opts.log_json = true,
            #[cfg(feature = "api")]
            "--serve" => opts.serve = true,
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --port (expected a u16)")?;
                let port = raw
                    .parse::<u16>()
                    .map_err(|_| format!("--port value \"{raw}\" is not a valid u16"))?;
                if opts.port.replace(port).is_some() {
                    return Err("--port provided more than once".to_string());
                }
            }
            "--help" | "-h" => {
                opts.help = true;
                return Ok(opts);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if opts.limits.is_some() && opts.preset.is_some() {
        return Err(
            "arguments `--limits` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    Ok(opts)
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("line-wizard: replay a line-configuration wizard session");
    eprintln!();
    eprintln!("Usage: line-wizard [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --session <path>    Replay a session script (TOML)");
    eprintln!("  --preset <name>     Field policy preset (standard, extended)");
    eprintln!("  --limits <path>     Field policy from a TOML file");
    eprintln!("  --json-out <path>   Write the submitted configuration as JSON");
    eprintln!("  --csv-out <path>    Write the consumer table as CSV");
    eprintln!("  --log-json          Emit logs as JSON lines");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve             Start the REST API instead of replaying");
        eprintln!("  --port <u16>        API server port (default: {DEFAULT_PORT})");
    }
    eprintln!("  --help              Show this help message");
    eprintln!();
    eprintln!("Without --session the default configuration is validated and submitted.");
}
