//! Iterative solvers on matrix-free operators
//!
//! This module contains a Davidson eigensolver for the lowest eigenpair of a
//! symmetric operator and a conjugate-gradient solver for symmetric positive
//! definite systems. Both only see the operator through callbacks.

mod cg;
mod davidson;

pub use cg::ConjugateGradient;
pub use davidson::{Davidson, DavidsonResult, DavidsonSettings};

/// Symmetric operator known through its action and its diagonal
pub trait LinearOperator {
    fn dimension(&self) -> usize;

    /// output = A input
    fn apply(&self, input: &[f64], output: &mut [f64]);

    /// Diagonal of A, used for preconditioning
    fn diagonal(&self, diag: &mut [f64]);
}
