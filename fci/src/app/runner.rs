use crate::config::{AnalysisParams, Args, Config, DensityResponseParams, GreensFunctionParams};
use color_eyre::eyre::{bail, eyre, Result, WrapErr};
use fci::{Fci, FciOptions};
use hamiltonian::{read_fcidump, Hamiltonian, PointGroup};
use num_complex::Complex64;
use std::path::{Path, PathBuf};
use tracing::info;

/// Integrals plus the particle sector to solve
pub struct System {
    pub ham: Hamiltonian,
    pub nel_up: usize,
    pub nel_down: usize,
    pub target_irrep: usize,
    pub max_memory_mb: f64,
}

pub struct GroundState {
    pub energy: f64,
    pub vector: Vec<f64>,
}

#[derive(Debug, Default)]
pub struct Analysis {
    pub rdm_energy: Option<f64>,
    /// sum_ij Gamma_ijij, equals N(N-1)
    pub two_rdm_trace: Option<f64>,
    /// sum_ijk Gamma_ijk,ijk, equals N(N-1)(N-2)
    pub three_rdm_trace: Option<f64>,
    pub spin_squared: Option<f64>,
}

pub fn load_system(args: &Args, config: &Config) -> Result<System> {
    let source = &config.hamiltonian;
    let (ham, defaults) = match (&source.fcidump, &source.hubbard) {
        (Some(path), None) => {
            let group = source
                .point_group
                .as_deref()
                .map(str::parse::<PointGroup>)
                .transpose()?;
            let (ham, header) = read_fcidump(resolve_path(&args.config_file, path), group)?;
            (ham, Some((header.nel_up(), header.nel_down(), header.isym)))
        }
        (None, Some(hubbard)) => {
            let ham = Hamiltonian::hubbard_chain(
                hubbard.sites,
                hubbard.hopping.unwrap_or(1.0),
                hubbard.onsite.unwrap_or(0.0),
                hubbard.periodic.unwrap_or(false),
            );
            (ham, None)
        }
        (Some(_), Some(_)) => bail!("Configure either an FCIDUMP file or a Hubbard chain, not both"),
        (None, None) => bail!("The hamiltonian section needs an fcidump path or a hubbard chain"),
    };

    let electrons = config.electrons.map(|e| (e.up, e.down));
    let nel_up = args
        .nel_up
        .or(electrons.map(|e| e.0))
        .or(defaults.map(|d| d.0))
        .ok_or_else(|| eyre!("Number of up electrons is not configured"))?;
    let nel_down = args
        .nel_down
        .or(electrons.map(|e| e.1))
        .or(defaults.map(|d| d.1))
        .ok_or_else(|| eyre!("Number of down electrons is not configured"))?;
    let target_irrep = args
        .target_irrep
        .or(config.target_irrep)
        .or(defaults.map(|d| d.2))
        .unwrap_or(0);
    let max_memory_mb = args.max_memory_mb.or(config.max_memory_mb).unwrap_or(100.0);

    Ok(System {
        ham,
        nel_up,
        nel_down,
        target_irrep,
        max_memory_mb,
    })
}

/// Paths in the configuration are relative to the configuration file
fn resolve_path(config_file: &str, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    Path::new(config_file)
        .parent()
        .map_or_else(|| path.to_path_buf(), |dir| dir.join(path))
}

pub fn build_fci(system: &System, config: &Config) -> Result<Fci> {
    let options = FciOptions {
        settings: config.solver_settings(),
        ..FciOptions::default()
    };
    Fci::with_options(
        &system.ham,
        system.nel_up,
        system.nel_down,
        system.target_irrep,
        system.max_memory_mb,
        options,
    )
    .wrap_err("Failed to set up the FCI space")
}

pub fn run_ground_state(fci: &Fci) -> Result<GroundState> {
    info!("\nStarting Davidson iterations...\n");
    let mut vector = vec![0.0; fci.vec_length(0)];
    let energy = fci
        .ground_state(Some(&mut vector))
        .wrap_err("Ground-state calculation failed")?;
    Ok(GroundState { energy, vector })
}

pub fn run_analysis(fci: &Fci, ground_state: &GroundState, params: &AnalysisParams) -> Analysis {
    let l = fci.num_orbitals();
    let num_electrons = fci.nel_up() + fci.nel_down();
    let mut analysis = Analysis::default();

    if params.two_rdm.unwrap_or(true) && num_electrons >= 2 {
        let mut two_rdm = vec![0.0; l.pow(4)];
        analysis.rdm_energy = Some(fci.fill_2rdm(&ground_state.vector, &mut two_rdm));
        analysis.two_rdm_trace = Some((0..l * l).map(|ij| two_rdm[ij + l * l * ij]).sum());
    }
    if params.three_rdm.unwrap_or(false) && num_electrons >= 3 {
        let mut three_rdm = vec![0.0; l.pow(6)];
        fci.fill_3rdm(&ground_state.vector, &mut three_rdm);
        let l3 = l * l * l;
        analysis.three_rdm_trace = Some((0..l3).map(|ijk| three_rdm[ijk + l3 * ijk]).sum());
    }
    if params.spin_squared.unwrap_or(true) {
        analysis.spin_squared = Some(fci.spin_squared(&ground_state.vector));
    }
    analysis
}

pub fn run_greens_function(
    fci: &Fci,
    system: &System,
    ground_state: &GroundState,
    params: &GreensFunctionParams,
) -> Result<Vec<(f64, Complex64)>> {
    let eta = params.eta.unwrap_or(0.1);
    let orb_alpha = params.orbital_alpha.unwrap_or(0);
    let orb_beta = params.orbital_beta.unwrap_or(orb_alpha);
    check_orbitals(fci, orb_alpha, orb_beta)?;
    let spin = params.spin.unwrap_or(fci::Spin::Up);

    info!("\nRetarded Green's function G_{}{} (spin {}, eta = {})", orb_alpha, orb_beta, spin, eta);
    params
        .grid
        .frequencies()
        .into_iter()
        .map(|omega| {
            let value = fci.retarded_gf(
                omega,
                eta,
                orb_alpha,
                orb_beta,
                spin,
                ground_state.energy,
                &ground_state.vector,
                &system.ham,
            )?;
            Ok((omega, value))
        })
        .collect()
}

pub fn run_density_response(
    fci: &Fci,
    ground_state: &GroundState,
    params: &DensityResponseParams,
) -> Result<Vec<(f64, Complex64)>> {
    let eta = params.eta.unwrap_or(0.1);
    let orb_alpha = params.orbital_alpha.unwrap_or(0);
    let orb_beta = params.orbital_beta.unwrap_or(orb_alpha);
    check_orbitals(fci, orb_alpha, orb_beta)?;

    info!("\nDensity response X_{}{} (eta = {})", orb_alpha, orb_beta, eta);
    params
        .grid
        .frequencies()
        .into_iter()
        .map(|omega| {
            let value = fci.density_response_gf(
                omega,
                eta,
                orb_alpha,
                orb_beta,
                ground_state.energy,
                &ground_state.vector,
            )?;
            Ok((omega, value))
        })
        .collect()
}

fn check_orbitals(fci: &Fci, orb_alpha: usize, orb_beta: usize) -> Result<()> {
    let l = fci.num_orbitals();
    if orb_alpha >= l || orb_beta >= l {
        bail!("Orbitals ({}, {}) out of range for {} orbitals", orb_alpha, orb_beta, l);
    }
    Ok(())
}
