//! Full configuration interaction core
//!
//! The determinant basis of every symmetry sector is addressed through dense
//! per-irrep string counters. Single excitations E_ij = Σ_σ a+_iσ a_jσ are
//! tabulated once per spin channel, and everything else is built on top of
//! those tables:
//!
//! - the Hamiltonian-vector product (Knowles-Handy),
//! - the application of E_ij between sectors, used for 2- and 3-RDMs,
//! - closed-form diagonals of H and H^2 for preconditioning,
//! - creation and annihilation operators between instances with N +- 1
//!   electrons, which the Green's function routines combine with a
//!   conjugate-gradient solver on the shifted resolvent.
//!
//! # Usage
//!
//! ```rust,ignore
//! use fci::{Fci, Spin};
//! use hamiltonian::Hamiltonian;
//!
//! let ham = Hamiltonian::hubbard_chain(4, 1.0, 4.0, false);
//! let fci = Fci::new(&ham, 2, 2, 0, 100.0)?;
//! let mut gs = vec![0.0; fci.vec_length(0)];
//! let e0 = fci.ground_state(Some(&mut gs))?;
//! let g = fci.retarded_gf(0.0, 0.1, 0, 0, Spin::Up, e0, &gs, &ham)?;
//! ```

mod diagonal;
mod excitation;
mod fci;
mod green;
mod hamiltonian_vector;
mod lookup;
mod rdm;
mod sectors;
mod solvers;
mod strings;
mod tests;

pub use fci::{Fci, FciOptions};
pub use green::{GfElement, GfMatrix, LadderOperator, RdmSelection, ResolventRdms, Spin};
pub use solvers::SolverSettings;
pub use strings::{Bitstring, MAX_ORBITALS};
