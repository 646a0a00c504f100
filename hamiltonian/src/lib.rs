//! Orbital integrals and Abelian point-group symmetry
//!
//! This crate holds everything a determinant-based correlation method needs to
//! know about the electronic Hamiltonian: the irrep of every orbital, the
//! multiplication table of the point group, one-body integrals T_ij,
//! two-body integrals <ij|kl> (physicist notation) and a constant energy.
//!
//! ```rust,ignore
//! use hamiltonian::{Hamiltonian, Integrals};
//!
//! let ham = Hamiltonian::hubbard_chain(4, 1.0, 4.0, false);
//! assert_eq!(ham.num_orbitals(), 4);
//! ```

pub mod fcidump;
pub mod hamiltonian;
pub mod integrals;
pub mod symmetry;

pub use fcidump::{parse_fcidump, read_fcidump, write_fcidump, FcidumpHeader};
pub use hamiltonian::Hamiltonian;
pub use integrals::Integrals;
pub use symmetry::PointGroup;
