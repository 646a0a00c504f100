//! FCI Calculation Command-Line Interface
//!
//! This is the main entry point for running FCI calculations with YAML configuration.

mod app;
mod config;
mod io;

use app::FciApplication;
use color_eyre::eyre::Result;

fn main() -> Result<()> {
    color_eyre::install()?;
    FciApplication::from_cli()?.run()
}
