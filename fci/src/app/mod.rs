mod report;
mod runner;

pub use runner::{build_fci, load_system, run_ground_state};

use self::report::{report_analysis_summary, report_ground_state_summary, report_spectrum_summary};
use self::runner::{run_analysis, run_density_response, run_greens_function};
use crate::config::{Args, Config};
use crate::io::setup_output;
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use std::fs;
use tracing::info;

pub struct FciApplication {
    args: Args,
    config: Config,
}

impl FciApplication {
    pub fn from_cli() -> Result<Self> {
        let args = Args::parse();
        let config = load_config(&args)?;
        Ok(Self { args, config })
    }

    pub fn run(self) -> Result<()> {
        setup_output(self.args.output.as_ref());
        info!("Configuration loaded from {}:\n{:?}", self.args.config_file, self.config);

        let system = load_system(&self.args, &self.config)?;
        let fci = build_fci(&system, &self.config)?;
        let ground_state = run_ground_state(&fci)?;
        report_ground_state_summary(&system, &fci, &ground_state);

        if let Some(params) = self.config.analysis.as_ref() {
            let analysis = run_analysis(&fci, &ground_state, params);
            report_analysis_summary(&fci, &ground_state, &analysis);
        }

        if let Some(params) = self.config.greens_function.as_ref() {
            let values = run_greens_function(&fci, &system, &ground_state, params)?;
            report_spectrum_summary("G", &values, params.output_file.as_ref())?;
        }

        if let Some(params) = self.config.density_response.as_ref() {
            let values = run_density_response(&fci, &ground_state, params)?;
            report_spectrum_summary("X", &values, params.output_file.as_ref())?;
        }

        Ok(())
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let config_content = fs::read_to_string(&args.config_file)
        .wrap_err_with(|| format!("Unable to read configuration file: {}", args.config_file))?;

    let config = serde_yml::from_str::<Config>(&config_content)
        .wrap_err("Failed to parse configuration file")?
        .with_defaults();

    Ok(config)
}
