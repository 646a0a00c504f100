//! Read-only view on the integrals of an electronic Hamiltonian

use crate::symmetry::PointGroup;

/// Second-quantized Hamiltonian with real orbitals
///
/// H = E_const + Σ_ij T_ij Σ_σ a†_iσ a_jσ + ½ Σ_ijkl <ij|kl> Σ_στ a†_iσ a†_jτ a_lτ a_kσ
///
/// Implementors guarantee the usual 8-fold permutation symmetry of the
/// two-body integrals and that T_ij vanishes between orbitals of different
/// irreps.
pub trait Integrals {
    /// Number of spatial orbitals L
    fn num_orbitals(&self) -> usize;

    fn group(&self) -> PointGroup;

    /// Irrep label of an orbital, in 0..group().num_irreps()
    fn orbital_irrep(&self, orbital: usize) -> usize;

    /// One-body integral T_ij
    fn one_body(&self, i: usize, j: usize) -> f64;

    /// Two-body integral <ij|kl> in physicist notation
    fn two_body(&self, i: usize, j: usize, k: usize, l: usize) -> f64;

    /// Nuclear repulsion and frozen-core energy
    fn constant_energy(&self) -> f64;
}
