//! Integration tests for the FCI library and driver
//!
//! These tests use the example FCIDUMP and YAML files to validate end-to-end
//! functionality against known reference values.

use std::path::PathBuf;

#[cfg(test)]
mod integration_tests {
    use super::*;
    use fci::{Fci, FciOptions, SilentObserver, Spin};
    use hamiltonian::{read_fcidump, Hamiltonian, Integrals};
    use std::process::Command;
    use std::sync::Arc;

    /// Helper function to get the path to example files
    fn example_path(filename: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("example")
            .join(filename)
    }

    fn silent() -> FciOptions {
        FciOptions {
            observer: Arc::new(SilentObserver),
            ..FciOptions::default()
        }
    }

    fn ground_state<H: Integrals>(ham: &H, nel_up: usize, nel_down: usize, target: usize) -> (Fci, f64, Vec<f64>) {
        let fci = Fci::with_options(ham, nel_up, nel_down, target, 100.0, silent()).unwrap();
        let mut gs = vec![0.0; fci.vec_length(0)];
        let energy = fci.ground_state(Some(&mut gs)).unwrap();
        (fci, energy, gs)
    }

    #[test]
    fn test_h2_fcidump_energy() {
        let (ham, header) = read_fcidump(example_path("h2.fcidump"), None).unwrap();
        let (fci, energy, _) = ground_state(&ham, header.nel_up(), header.nel_down(), header.isym);
        assert_eq!(fci.vec_length(0), 2);

        // two-determinant problem |1a 1b>, |2a 2b>
        let h11: f64 = 2.0 * -1.2563390730 + 0.6757101548;
        let h22: f64 = 2.0 * -0.4718960244 + 0.6985682218;
        let k: f64 = 0.1809312711;
        let exact = 0.5 * (h11 + h22) - (0.25 * (h11 - h22).powi(2) + k * k).sqrt() + 0.7137539936;
        assert!((energy - exact).abs() < 1e-10);
    }

    #[test]
    fn test_hubbard_fcidump_matches_builder() {
        let (ham, header) = read_fcidump(example_path("hubbard4.fcidump"), None).unwrap();
        let (_, from_file, _) = ground_state(&ham, header.nel_up(), header.nel_down(), header.isym);
        let chain = Hamiltonian::hubbard_chain(4, 1.0, 4.0, false);
        let (_, from_builder, _) = ground_state(&chain, 2, 2, 0);
        assert!((from_file - from_builder).abs() < 1e-10);
    }

    #[test]
    fn test_hubbard_spectral_weight_is_positive() {
        let ham = Hamiltonian::hubbard_chain(4, 1.0, 4.0, false);
        let (fci, e0, gs) = ground_state(&ham, 2, 2, 0);
        for omega in [-3.0, -1.0, 0.0, 1.0, 3.0] {
            let g = fci.retarded_gf(omega, 0.2, 0, 0, Spin::Up, e0, &gs, &ham).unwrap();
            assert!(-g.im >= 0.0, "negative spectral weight at omega = {}", omega);
        }
        // particle-hole symmetry at half filling: A(U/2 + w) = A(U/2 - w)
        let left = fci.retarded_gf(0.5, 0.2, 0, 0, Spin::Up, e0, &gs, &ham).unwrap();
        let right = fci.retarded_gf(3.5, 0.2, 0, 0, Spin::Up, e0, &gs, &ham).unwrap();
        assert!((left.im - right.im).abs() < 1e-6);
    }

    #[test]
    fn test_driver_runs_hubbard_example() {
        let log = std::env::temp_dir().join("fci_hubbard_example.log");
        let status = Command::new(env!("CARGO_BIN_EXE_fci"))
            .arg("--config-file")
            .arg(example_path("hubbard.yaml"))
            .arg("--output")
            .arg(&log)
            .status()
            .unwrap();
        assert!(status.success());

        let text = std::fs::read_to_string(&log).unwrap();
        assert!(text.contains("FCI ground-state energy"));
        assert!(text.contains("2-RDM energy"));
        assert!(text.contains("3-RDM trace"));
    }

    #[test]
    fn test_driver_runs_fcidump_example() {
        let log = std::env::temp_dir().join("fci_h2_example.log");
        let status = Command::new(env!("CARGO_BIN_EXE_fci"))
            .arg("--config-file")
            .arg(example_path("h2.yaml"))
            .arg("--output")
            .arg(&log)
            .status()
            .unwrap();
        assert!(status.success());
        let text = std::fs::read_to_string(&log).unwrap();
        assert!(text.contains("FCI ground-state energy"));
    }

    #[test]
    fn test_driver_rejects_missing_config() {
        let status = Command::new(env!("CARGO_BIN_EXE_fci"))
            .arg("--config-file")
            .arg(example_path("does_not_exist.yaml"))
            .status()
            .unwrap();
        assert!(!status.success());
    }
}
