//! Full configuration interaction with Abelian point-group symmetry
//!
//! The determinant space of a fixed number of up and down electrons is split
//! into symmetry sectors, the Hamiltonian is applied as a linear operator
//! through single-excitation lookup tables (Knowles-Handy), and ground states,
//! reduced density matrices, <S^2> and Green's functions are extracted with
//! iterative solvers.
//!
//! ```rust,ignore
//! use fci::Fci;
//! use hamiltonian::Hamiltonian;
//!
//! let ham = Hamiltonian::hubbard_chain(4, 1.0, 4.0, false);
//! let fci = Fci::new(&ham, 2, 2, 0, 100.0)?;
//! let mut gs = vec![0.0; fci.vec_length(0)];
//! let energy = fci.ground_state(Some(&mut gs))?;
//! ```

pub mod fci_impl;
pub mod linalg;
pub mod observer;
pub mod solver_impl;

pub use fci_impl::{
    Bitstring, Fci, FciOptions, GfElement, GfMatrix, LadderOperator, RdmSelection, ResolventRdms,
    SolverSettings, Spin, MAX_ORBITALS,
};
pub use linalg::{DenseKernels, NalgebraKernels};
pub use observer::{FciObserver, SilentObserver, TracingObserver};
