//! Configuration management for FCI calculations
//!
//! This module handles the YAML configuration structures and their defaults.
//! Every optional section is filled in by `with_defaults` right after parsing.

mod args;

pub use args::Args;

use fci::solver_impl::DavidsonSettings;
use fci::{SolverSettings, Spin};
use serde::{Deserialize, Serialize};

/// Main configuration structure for FCI calculations
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub hamiltonian: HamiltonianSource,
    pub electrons: Option<Electrons>,
    pub target_irrep: Option<usize>,
    pub max_memory_mb: Option<f64>,
    pub davidson: Option<DavidsonParams>,
    pub cg: Option<CgParams>,
    pub analysis: Option<AnalysisParams>,
    pub greens_function: Option<GreensFunctionParams>,
    pub density_response: Option<DensityResponseParams>,
}

impl Config {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        if self.max_memory_mb.is_none() {
            self.max_memory_mb = Some(100.0);
        }
        self.davidson = Some(self.davidson.unwrap_or_default().with_defaults());
        self.cg = Some(self.cg.unwrap_or_default().with_defaults());
        self.analysis = Some(self.analysis.unwrap_or_default().with_defaults());
        self.greens_function = self.greens_function.map(GreensFunctionParams::with_defaults);
        self.density_response = self.density_response.map(DensityResponseParams::with_defaults);
        self
    }

    /// Solver settings of the davidson and cg sections
    pub fn solver_settings(&self) -> SolverSettings {
        let davidson = self.davidson.clone().unwrap_or_default().with_defaults();
        let cg = self.cg.clone().unwrap_or_default().with_defaults();
        let defaults = SolverSettings::default();
        SolverSettings {
            davidson: DavidsonSettings {
                num_vectors: davidson.num_vectors.unwrap_or(defaults.davidson.num_vectors),
                keep_vectors: davidson.keep_vectors.unwrap_or(defaults.davidson.keep_vectors),
                residual_tolerance: davidson
                    .residual_tolerance
                    .unwrap_or(defaults.davidson.residual_tolerance),
                precond_cutoff: davidson.precond_cutoff.unwrap_or(defaults.davidson.precond_cutoff),
                max_iterations: davidson.max_iterations,
            },
            max_cg_iterations: cg.max_iterations,
            seed: davidson.seed.unwrap_or(defaults.seed),
        }
    }
}

/// Where the integrals come from: an FCIDUMP file or a Hubbard chain
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HamiltonianSource {
    /// Path to an FCIDUMP file, relative to the configuration file
    pub fcidump: Option<String>,
    /// Point group of the FCIDUMP orbitals (default: smallest group covering ORBSYM)
    pub point_group: Option<String>,
    pub hubbard: Option<HubbardParams>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HubbardParams {
    pub sites: usize,
    pub hopping: Option<f64>,
    pub onsite: Option<f64>,
    pub periodic: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
pub struct Electrons {
    pub up: usize,
    pub down: usize,
}

/// Davidson parameters
#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct DavidsonParams {
    pub num_vectors: Option<usize>,
    pub keep_vectors: Option<usize>,
    pub residual_tolerance: Option<f64>,
    pub precond_cutoff: Option<f64>,
    pub max_iterations: Option<usize>,
    pub seed: Option<u64>,
}

impl DavidsonParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = DavidsonSettings::default();
        if self.num_vectors.is_none() {
            self.num_vectors = Some(defaults.num_vectors);
        }
        if self.keep_vectors.is_none() {
            self.keep_vectors = Some(defaults.keep_vectors);
        }
        if self.residual_tolerance.is_none() {
            self.residual_tolerance = Some(defaults.residual_tolerance);
        }
        if self.precond_cutoff.is_none() {
            self.precond_cutoff = Some(defaults.precond_cutoff);
        }
        if self.seed.is_none() {
            self.seed = Some(SolverSettings::default().seed);
        }
        self
    }
}

/// Conjugate-gradient parameters
#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct CgParams {
    pub max_iterations: Option<usize>,
}

impl CgParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        if self.max_iterations.is_none() {
            self.max_iterations = SolverSettings::default().max_cg_iterations;
        }
        self
    }
}

/// Ground-state analysis switches
#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct AnalysisParams {
    pub two_rdm: Option<bool>,
    pub three_rdm: Option<bool>,
    pub spin_squared: Option<bool>,
}

impl AnalysisParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        if self.two_rdm.is_none() {
            self.two_rdm = Some(true);
        }
        if self.three_rdm.is_none() {
            self.three_rdm = Some(false);
        }
        if self.spin_squared.is_none() {
            self.spin_squared = Some(true);
        }
        self
    }
}

/// Frequency grid: a single `omega`, or `num_points` values from `omega` to `omega_max`
#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct FrequencyGrid {
    pub omega: Option<f64>,
    pub omega_max: Option<f64>,
    pub num_points: Option<usize>,
}

impl FrequencyGrid {
    pub fn frequencies(&self) -> Vec<f64> {
        let start = self.omega.unwrap_or(0.0);
        match (self.omega_max, self.num_points) {
            (Some(end), Some(points)) if points > 1 => {
                let step = (end - start) / (points - 1) as f64;
                (0..points).map(|i| start + step * i as f64).collect()
            }
            _ => vec![start],
        }
    }
}

/// Retarded single-particle Green's function parameters
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GreensFunctionParams {
    #[serde(flatten)]
    pub grid: FrequencyGrid,
    pub eta: Option<f64>,
    pub orbital_alpha: Option<usize>,
    pub orbital_beta: Option<usize>,
    pub spin: Option<Spin>,
    /// Optional table of the sweep
    pub output_file: Option<String>,
}

impl GreensFunctionParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        if self.grid.omega.is_none() {
            self.grid.omega = Some(0.0);
        }
        if self.eta.is_none() {
            self.eta = Some(0.1);
        }
        if self.orbital_alpha.is_none() {
            self.orbital_alpha = Some(0);
        }
        if self.orbital_beta.is_none() {
            self.orbital_beta = self.orbital_alpha;
        }
        if self.spin.is_none() {
            self.spin = Some(Spin::Up);
        }
        self
    }
}

/// Density response parameters
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DensityResponseParams {
    #[serde(flatten)]
    pub grid: FrequencyGrid,
    pub eta: Option<f64>,
    pub orbital_alpha: Option<usize>,
    pub orbital_beta: Option<usize>,
    /// Optional table of the sweep
    pub output_file: Option<String>,
}

impl DensityResponseParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        if self.grid.omega.is_none() {
            self.grid.omega = Some(0.0);
        }
        if self.eta.is_none() {
            self.eta = Some(0.1);
        }
        if self.orbital_alpha.is_none() {
            self.orbital_alpha = Some(0);
        }
        if self.orbital_beta.is_none() {
            self.orbital_beta = self.orbital_alpha;
        }
        self
    }
}
