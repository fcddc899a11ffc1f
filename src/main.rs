//! Line wizard entry point: CLI wiring, session replay and submission.

mod cli;

use std::process;

use line_wizard::config::WizardConfig;
use line_wizard::io::sink::{CsvFileSink, JsonFileSink, LogSink, SubmissionSink};
use line_wizard::runner::replay;
use line_wizard::script::SessionScript;
use line_wizard::telemetry::init_tracing;

use cli::CliOptions;

/// Resolves the field policy: `--limits` file, then `--preset`, then the
/// script's own preset, then the standard preset.
fn load_config(cli: &CliOptions, script: &SessionScript) -> WizardConfig {
    let result = if let Some(ref path) = cli.limits {
        WizardConfig::from_toml_file(path)
    } else if let Some(ref name) = cli.preset {
        WizardConfig::from_preset(name)
    } else {
        script.config_or(WizardConfig::standard())
    };
    result.unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    })
}

fn build_sinks(cli: &CliOptions) -> Vec<Box<dyn SubmissionSink>> {
    let mut sinks: Vec<Box<dyn SubmissionSink>> = vec![Box::new(LogSink)];
    if let Some(ref path) = cli.json_out {
        sinks.push(Box::new(JsonFileSink::new(path)));
    }
    if let Some(ref path) = cli.csv_out {
        sinks.push(Box::new(CsvFileSink::new(path)));
    }
    sinks
}

#[cfg(feature = "api")]
fn serve(config: WizardConfig, port: u16) {
    use std::net::SocketAddr;
    use std::sync::Arc;

    let state = Arc::new(line_wizard::api::AppState { config });
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("error: failed to create tokio runtime: {e}");
        process::exit(1);
    });
    if let Err(e) = rt.block_on(line_wizard::api::serve(state, addr)) {
        eprintln!("error: API server failed: {e}");
        process::exit(1);
    }
}

fn main() {
    let cli = cli::parse_args().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        cli::print_usage();
        process::exit(1);
    });
    if cli.help {
        cli::print_usage();
        return;
    }

    init_tracing(cli.log_json);

    let script = match cli.session {
        Some(ref path) => SessionScript::from_toml_file(path).unwrap_or_else(|e| {
            eprintln!("{e}");
            process::exit(1);
        }),
        None => SessionScript::default(),
    };

    let config = load_config(&cli, &script);
    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    #[cfg(feature = "api")]
    if cli.serve {
        serve(config, cli.port.unwrap_or(cli::DEFAULT_PORT));
        return;
    }

    let run = replay(&script, &config);
    for outcome in &run.outcomes {
        println!("{outcome}");
    }
    println!("\n{}", run.session.line());

    let errors = run.session.errors();
    if !errors.is_empty() {
        eprintln!("\nconfiguration is not submittable:\n{errors}");
        process::exit(1);
    }

    for mut sink in build_sinks(&cli) {
        if let Err(e) = run.session.submit(sink.as_mut()) {
            eprintln!("error: {} sink: {e}", sink.name());
            process::exit(1);
        }
    }

    if let Some(ref path) = cli.json_out {
        eprintln!("Configuration written to {}", path.display());
    }
    if let Some(ref path) = cli.csv_out {
        eprintln!("Consumer table written to {}", path.display());
    }
}
