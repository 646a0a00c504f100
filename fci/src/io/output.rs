//! Output formatting and logging utilities

use color_eyre::eyre::Result;
use num_complex::Complex64;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::time::SystemTime as StdSystemTime;
use tracing::info;
use tracing_subscriber::{
    fmt::format::Writer, fmt::layer, fmt::time::FormatTime, layer::SubscriberExt,
    util::SubscriberInitExt, Registry,
};

/// Custom time formatter that shows only seconds
struct SecondPrecisionTimer;

impl FormatTime for SecondPrecisionTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let duration = StdSystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();

        // HH:MM:SS
        let total_seconds = duration.as_secs();
        let hours = (total_seconds / 3600) % 24;
        let minutes = (total_seconds / 60) % 60;
        let seconds = total_seconds % 60;

        write!(w, "{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Setup output logging to file or stdout
pub fn setup_output(output_path: Option<&String>) {
    match output_path {
        Some(path) => match File::create(path) {
            Ok(log) => {
                let file_layer = layer()
                    .with_writer(log)
                    .with_timer(SecondPrecisionTimer)
                    .with_ansi(false);
                Registry::default().with(file_layer).init();
                info!("Output will be written to: {}", path);
            }
            Err(err) => eprintln!("Could not create output file {}: {}", path, err),
        },
        None => {
            let stdout_layer = layer()
                .with_writer(std::io::stdout)
                .with_timer(SecondPrecisionTimer)
                .with_ansi(true);
            Registry::default().with(stdout_layer).init();
            info!("Output will be printed to stdout");
        }
    }
}

/// Write a frequency table: omega, Re, Im, -Im/pi
pub fn write_spectrum<W: Write>(writer: &mut W, label: &str, values: &[(f64, Complex64)]) -> Result<()> {
    writeln!(writer, "# {}: omega  Re  Im  -Im/pi", label)?;
    for (omega, value) in values {
        writeln!(
            writer,
            "{:>14.8} {:>18.10e} {:>18.10e} {:>18.10e}",
            omega,
            value.re,
            value.im,
            -value.im / std::f64::consts::PI
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_spectrum() {
        let mut buffer = Vec::new();
        let values = [(0.0, Complex64::new(1.0, -std::f64::consts::PI)), (0.5, Complex64::new(0.0, 0.0))];
        write_spectrum(&mut buffer, "G", &values).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("# G"));
        let columns: Vec<f64> = lines[1].split_whitespace().map(|v| v.parse().unwrap()).collect();
        assert_eq!(columns.len(), 4);
        assert!((columns[3] - 1.0).abs() < 1e-9);
    }
}
