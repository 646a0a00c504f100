//! Command-line argument parsing for FCI calculations

use clap::Parser;

/// Full configuration interaction with YAML configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config_file: String,

    /// Override output file: (default stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Override the Hamiltonian-vector workspace limit (MB)
    #[arg(long)]
    pub max_memory_mb: Option<f64>,

    /// Override the target irrep
    #[arg(long)]
    pub target_irrep: Option<usize>,

    /// Override the number of up electrons
    #[arg(long)]
    pub nel_up: Option<usize>,

    /// Override the number of down electrons
    #[arg(long)]
    pub nel_down: Option<usize>,
}
