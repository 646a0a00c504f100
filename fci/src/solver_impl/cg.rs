//! Conjugate gradient for symmetric positive definite operators

use crate::linalg::DenseKernels;
use crate::observer::FciObserver;
use color_eyre::eyre::{bail, Result};

/// Conjugate gradient solver
#[derive(Debug, Clone)]
pub struct ConjugateGradient {
    /// Convergence threshold on the two-norm of the residual
    pub threshold: f64,
    pub max_iterations: Option<usize>,
}

impl ConjugateGradient {
    pub fn new(threshold: f64, max_iterations: Option<usize>) -> Self {
        ConjugateGradient {
            threshold,
            max_iterations,
        }
    }

    /// Solve A x = b in place
    ///
    /// `solution` holds the initial guess on entry, `residual` holds b on entry
    /// and the final residual b - A x on exit. Returns the number of steps.
    pub fn solve<F>(
        &self,
        mut apply: F,
        solution: &mut [f64],
        residual: &mut [f64],
        kernels: &dyn DenseKernels,
        observer: &dyn FciObserver,
    ) -> Result<usize>
    where
        F: FnMut(&[f64], &mut [f64]),
    {
        let n = solution.len();
        assert_eq!(residual.len(), n, "conjugate gradient: residual length");
        let mut direction = vec![0.0; n];
        let mut image = vec![0.0; n];

        // r_0 = b - A x_0, p_0 = r_0
        apply(&*solution, &mut image);
        kernels.axpy(-1.0, &image, residual);
        kernels.copy(&*residual, &mut direction);
        let mut r_squared = kernels.dot(&*residual, &*residual);
        let mut residual_norm = r_squared.sqrt();

        let mut step = 0;
        while residual_norm >= self.threshold {
            if let Some(max_iterations) = self.max_iterations {
                if step >= max_iterations {
                    bail!(
                        "Conjugate gradient did not converge in {} steps (residual norm {:.3e}, threshold {:.3e})",
                        max_iterations,
                        residual_norm,
                        self.threshold
                    );
                }
            }

            apply(&direction, &mut image);
            let alpha = r_squared / kernels.dot(&direction, &image);
            kernels.axpy(alpha, &direction, solution);
            kernels.axpy(-alpha, &image, residual);
            let r_squared_next = kernels.dot(&*residual, &*residual);
            let beta = r_squared_next / r_squared;
            for (p, &r) in direction.iter_mut().zip(residual.iter()) {
                *p = r + beta * *p;
            }

            step += 1;
            r_squared = r_squared_next;
            residual_norm = r_squared.sqrt();
            observer.cg_step(step, residual_norm);
        }

        Ok(step)
    }
}
