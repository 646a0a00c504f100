//! Diagnostic checkpoints of the FCI solver
//!
//! The solver never prints. It reports to an [`FciObserver`] at a few well
//! defined points (construction, end of a routine, solver iterations), never
//! from inside a parallel loop.

use hamiltonian::PointGroup;
use num_complex::Complex64;
use tracing::{debug, info};

/// Summary of a freshly constructed FCI instance
#[derive(Debug, Clone)]
pub struct StartupSummary {
    pub num_orbitals: usize,
    pub nel_up: usize,
    pub nel_down: usize,
    pub group: PointGroup,
    pub target_irrep: usize,
    /// Number of up/down strings per irrep
    pub up_counts: Vec<usize>,
    pub down_counts: Vec<usize>,
    /// Length of the FCI vector of the target sector
    pub vec_length: usize,
    /// Workspace needed for a single-tile Hamiltonian-vector product (elements)
    pub required_workspace: usize,
    /// Workspace actually allocated (elements)
    pub workspace: usize,
}

pub trait FciObserver: Send + Sync {
    fn startup(&self, _summary: &StartupSummary) {}

    /// Wall time of a named routine
    fn routine_finished(&self, _routine: &str, _seconds: f64) {}

    fn davidson_iteration(&self, _iteration: usize, _eigenvalue: f64, _residual_norm: f64) {}

    fn davidson_converged(&self, _multiplications: usize, _energy: f64) {}

    fn cg_start(&self, _rhs_norm: f64, _threshold: f64) {}

    fn cg_step(&self, _step: usize, _residual_norm: f64) {}

    /// Unpreconditioned residual of a solved complex linear system
    fn cg_solution_check(&self, _residual_norm: f64) {}

    fn spin_squared(&self, _measured: f64, _intended: f64) {}

    fn rdm_energy(&self, _energy: f64) {}

    fn greens_function(&self, _kind: &str, _omega: f64, _eta: f64, _left: usize, _right: usize, _value: Complex64) {}
}

/// Forwards every checkpoint to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl FciObserver for TracingObserver {
    fn startup(&self, summary: &StartupSummary) {
        info!("===========================================");
        info!("        FCI Initialization");
        info!("===========================================");
        info!("Number of orbitals: {}", summary.num_orbitals);
        info!("Electrons (up, down): ({}, {})", summary.nel_up, summary.nel_down);
        info!(
            "Point group: {} ; target irrep: {} ({})",
            summary.group,
            summary.target_irrep,
            summary.group.irrep_name(summary.target_irrep)
        );
        for (irrep, (up, down)) in summary.up_counts.iter().zip(&summary.down_counts).enumerate() {
            debug!("  irrep {}: {} up strings, {} down strings", irrep, up, down);
        }
        info!("Number of variables in the FCI vector: {}", summary.vec_length);
        info!(
            "Hamiltonian-vector workspace: {:.3} MB (single tile needs {:.3} MB)",
            16.0e-6 * summary.workspace as f64,
            16.0e-6 * summary.required_workspace as f64
        );
        info!("===========================================");
    }

    fn routine_finished(&self, routine: &str, seconds: f64) {
        debug!("FCI::{} : wall time = {:.3} s", routine, seconds);
    }

    fn davidson_iteration(&self, iteration: usize, eigenvalue: f64, residual_norm: f64) {
        debug!(
            "  Davidson iteration {:4}: eigenvalue = {:.12}, |r| = {:.3e}",
            iteration, eigenvalue, residual_norm
        );
    }

    fn davidson_converged(&self, multiplications: usize, energy: f64) {
        info!(
            "Davidson converged after {} matrix-vector products: E = {:.12} Eh",
            multiplications, energy
        );
    }

    fn cg_start(&self, rhs_norm: f64, threshold: f64) {
        debug!("  CG: |rhs| = {:.6e}, residual threshold = {:.3e}", rhs_norm, threshold);
    }

    fn cg_step(&self, step: usize, residual_norm: f64) {
        debug!("  CG step {:4}: |r| = {:.6e}", step, residual_norm);
    }

    fn cg_solution_check(&self, residual_norm: f64) {
        info!("CG solution check (no preconditioner): |(a + bH + i eta) x - rhs| = {:.3e}", residual_norm);
    }

    fn spin_squared(&self, measured: f64, intended: f64) {
        info!("<S^2> = {:.10} (intended S(S+1) = {:.4})", measured, intended);
    }

    fn rdm_energy(&self, energy: f64) {
        info!("Energy from the 2-RDM: {:.12} Eh", energy);
    }

    fn greens_function(&self, kind: &str, omega: f64, eta: f64, left: usize, right: usize, value: Complex64) {
        info!(
            "{}(omega = {:.6}, eta = {:.6}, i = {}, j = {}) = {:.10} + i {:.10}",
            kind, omega, eta, left, right, value.re, value.im
        );
        info!("  local spectral weight -Im/pi = {:.10}", -value.im / std::f64::consts::PI);
    }
}

/// Swallows every checkpoint
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl FciObserver for SilentObserver {}
