use crate::app::runner::{Analysis, GroundState, System};
use crate::io::write_spectrum;
use color_eyre::eyre::{Result, WrapErr};
use fci::Fci;
use hamiltonian::Integrals;
use num_complex::Complex64;
use std::fs::File;
use tracing::info;

/// Largest ground-state amplitudes shown in the summary
const NUM_LEADING_DETERMINANTS: usize = 5;

pub fn report_ground_state_summary(system: &System, fci: &Fci, ground_state: &GroundState) {
    info!("\nFCI calculation finished.");
    info!(
        "  Orbitals: {} ; electrons (up, down): ({}, {}) ; target irrep: {}",
        system.ham.num_orbitals(),
        system.nel_up,
        system.nel_down,
        system.target_irrep
    );
    info!("  Determinants in the target sector: {}", fci.vec_length(0));
    info!("\nFCI ground-state energy: {:.12} Eh", ground_state.energy);

    let mut order: Vec<usize> = (0..ground_state.vector.len()).collect();
    order.sort_by(|&a, &b| ground_state.vector[b].abs().total_cmp(&ground_state.vector[a].abs()));
    info!("\nLeading determinants (up | down):");
    for &counter in order.iter().take(NUM_LEADING_DETERMINANTS) {
        let (up, down) = fci.bitstrings_of_counter(0, counter);
        info!(
            "  {} | {} : {:+.8}",
            occupation_string(up, fci.num_orbitals()),
            occupation_string(down, fci.num_orbitals()),
            ground_state.vector[counter]
        );
    }
}

pub fn report_analysis_summary(fci: &Fci, ground_state: &GroundState, analysis: &Analysis) {
    let n = (fci.nel_up() + fci.nel_down()) as f64;
    if let Some(energy) = analysis.rdm_energy {
        info!(
            "\n2-RDM energy: {:.12} Eh (difference with Davidson {:.3e})",
            energy,
            energy - ground_state.energy
        );
    }
    if let Some(trace) = analysis.two_rdm_trace {
        info!("2-RDM trace: {:.10} (N(N-1) = {})", trace, n * (n - 1.0));
    }
    if let Some(trace) = analysis.three_rdm_trace {
        info!("3-RDM trace: {:.10} (N(N-1)(N-2) = {})", trace, n * (n - 1.0) * (n - 2.0));
    }
    if let Some(s2) = analysis.spin_squared {
        info!("<S^2> of the ground state: {:.10}", s2);
    }
}

pub fn report_spectrum_summary(label: &str, values: &[(f64, Complex64)], output_file: Option<&String>) -> Result<()> {
    info!("\n{} on {} frequencies:", label, values.len());
    info!("  {:>12} {:>18} {:>18} {:>18}", "omega", "Re", "Im", "-Im/pi");
    for (omega, value) in values {
        info!(
            "  {:>12.6} {:>18.10} {:>18.10} {:>18.10}",
            omega,
            value.re,
            value.im,
            -value.im / std::f64::consts::PI
        );
    }

    if let Some(path) = output_file {
        let mut file = File::create(path).wrap_err_with(|| format!("Unable to create spectrum file: {}", path))?;
        write_spectrum(&mut file, label, values)?;
        info!("{} table written to: {}", label, path);
    }
    Ok(())
}

fn occupation_string(string: u32, num_orbitals: usize) -> String {
    (0..num_orbitals)
        .map(|orb| if string & (1 << orb) != 0 { '1' } else { '0' })
        .collect()
}
