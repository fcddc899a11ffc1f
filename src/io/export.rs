//! CSV export of the per-consumer power table.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::line::LineConfiguration;
use crate::line::reconciler::even_share_kw;

/// Column header for the consumer table.
const HEADER: &str = "consumer,power_kw,share_pct";

/// Per-consumer powers of `line`: the entries in individual mode, the even
/// split of the total otherwise.
pub fn consumer_powers_kw(line: &LineConfiguration) -> Vec<f64> {
    if line.show_individual_powers {
        line.individual_powers.powers_kw().collect()
    } else {
        let share = even_share_kw(line.total_power_kw, line.total_consumers);
        vec![share; line.total_consumers as usize]
    }
}

/// Exports the consumer table of `line` to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(line: &LineConfiguration, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(line, buf)
}

/// Writes the consumer table as CSV to any writer.
///
/// One row per consumer (1-based), its power in kW and its share of the
/// declared total in percent.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(line: &LineConfiguration, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(','))?;

    for (i, power_kw) in consumer_powers_kw(line).into_iter().enumerate() {
        let share_pct = if line.total_power_kw > 0.0 {
            100.0 * power_kw / line.total_power_kw
        } else {
            0.0
        };
        wtr.write_record(&[
            (i + 1).to_string(),
            format!("{power_kw:.4}"),
            format!("{share_pct:.2}"),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
