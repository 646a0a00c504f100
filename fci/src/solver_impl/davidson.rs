//! Davidson eigensolver for the lowest eigenpair

extern crate nalgebra as na;

use super::LinearOperator;
use crate::linalg::{fill_random, frobenius_norm, DenseKernels};
use crate::observer::FciObserver;
use color_eyre::eyre::{bail, ensure, Result};
use na::DMatrix;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Norm below which a correction vector counts as linearly dependent
const DEPENDENCE_THRESHOLD: f64 = 1e-10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DavidsonSettings {
    /// Subspace size that triggers a restart
    pub num_vectors: usize,
    /// Ritz vectors kept at a restart
    pub keep_vectors: usize,
    /// Convergence threshold on the residual norm
    pub residual_tolerance: f64,
    /// Smallest |diag - theta| used by the diagonal preconditioner
    pub precond_cutoff: f64,
    pub max_iterations: Option<usize>,
}

impl Default for DavidsonSettings {
    fn default() -> Self {
        DavidsonSettings {
            num_vectors: 32,
            keep_vectors: 3,
            residual_tolerance: 1e-10,
            precond_cutoff: 1e-12,
            max_iterations: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DavidsonResult {
    pub eigenvalue: f64,
    /// Normalized eigenvector
    pub eigenvector: Vec<f64>,
    pub iterations: usize,
    /// Number of operator applications
    pub multiplications: usize,
}

pub struct Davidson {
    settings: DavidsonSettings,
}

impl Davidson {
    pub fn new(settings: DavidsonSettings) -> Self {
        Davidson { settings }
    }

    pub fn settings(&self) -> &DavidsonSettings {
        &self.settings
    }

    /// Lowest eigenpair of `op`, starting from `guess`
    pub fn solve<O: LinearOperator + ?Sized>(
        &self,
        op: &O,
        guess: &[f64],
        kernels: &dyn DenseKernels,
        observer: &dyn FciObserver,
    ) -> Result<DavidsonResult> {
        let n = op.dimension();
        ensure!(n > 0, "Davidson needs a non-empty vector space");
        assert_eq!(guess.len(), n, "Davidson: guess length");

        let max_vectors = self.settings.num_vectors.max(2);
        let keep_vectors = self.settings.keep_vectors.clamp(1, max_vectors - 1);
        let cutoff = self.settings.precond_cutoff;

        let mut diag = vec![0.0; n];
        op.diagonal(&mut diag);

        let mut basis: Vec<Vec<f64>> = Vec::with_capacity(max_vectors);
        let mut images: Vec<Vec<f64>> = Vec::with_capacity(max_vectors);
        let mut subspace = DMatrix::<f64>::zeros(0, 0);
        let mut rng = StdRng::seed_from_u64(n as u64);

        let mut candidate = guess.to_vec();
        if !orthonormalize(&mut candidate, &basis, kernels) {
            fill_random(&mut candidate, &mut rng);
            orthonormalize(&mut candidate, &basis, kernels);
        }

        let mut iterations = 0;
        let mut multiplications = 0;
        loop {
            let mut image = vec![0.0; n];
            op.apply(&candidate, &mut image);
            multiplications += 1;
            basis.push(candidate);
            images.push(image);

            let k = basis.len();
            let mut grown = DMatrix::<f64>::zeros(k, k);
            grown.view_mut((0, 0), (k - 1, k - 1)).copy_from(&subspace);
            for i in 0..k {
                let value = kernels.dot(&basis[i], &images[k - 1]);
                grown[(i, k - 1)] = value;
                grown[(k - 1, i)] = value;
            }
            subspace = grown;

            let eigen = subspace.clone().symmetric_eigen();
            let mut order: Vec<usize> = (0..k).collect();
            order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));
            let theta = eigen.eigenvalues[order[0]];

            let lowest = column(&eigen.eigenvectors, order[0]);
            let ritz = combine(&basis, &lowest, kernels);
            let mut residual = combine(&images, &lowest, kernels);
            kernels.axpy(-theta, &ritz, &mut residual);
            let residual_norm = frobenius_norm(&residual);

            iterations += 1;
            observer.davidson_iteration(iterations, theta, residual_norm);

            let converged = DavidsonResult {
                eigenvalue: theta,
                eigenvector: ritz,
                iterations,
                multiplications,
            };
            if residual_norm < self.settings.residual_tolerance {
                return Ok(converged);
            }
            if let Some(max_iterations) = self.settings.max_iterations {
                if iterations >= max_iterations {
                    bail!(
                        "Davidson did not converge in {} iterations (residual norm {:.3e})",
                        max_iterations,
                        residual_norm
                    );
                }
            }

            if k >= max_vectors {
                let kept: Vec<usize> = order.iter().copied().take(keep_vectors).collect();
                let new_basis = kept
                    .iter()
                    .map(|&col| combine(&basis, &column(&eigen.eigenvectors, col), kernels))
                    .collect();
                let new_images = kept
                    .iter()
                    .map(|&col| combine(&images, &column(&eigen.eigenvectors, col), kernels))
                    .collect();
                basis = new_basis;
                images = new_images;
                subspace = DMatrix::from_fn(kept.len(), kept.len(), |i, j| {
                    if i == j {
                        eigen.eigenvalues[kept[i]]
                    } else {
                        0.0
                    }
                });
            }

            candidate = residual
                .iter()
                .zip(&diag)
                .map(|(&r, &d)| {
                    let shift = d - theta;
                    if shift.abs() > cutoff {
                        r / shift
                    } else {
                        r / cutoff
                    }
                })
                .collect();
            if orthonormalize(&mut candidate, &basis, kernels) {
                continue;
            }
            candidate = residual;
            if orthonormalize(&mut candidate, &basis, kernels) {
                continue;
            }
            fill_random(&mut candidate, &mut rng);
            if !orthonormalize(&mut candidate, &basis, kernels) {
                // the subspace spans the whole space, the Ritz pair is exact
                return Ok(converged);
            }
        }
    }
}

fn column(matrix: &DMatrix<f64>, col: usize) -> Vec<f64> {
    matrix.column(col).iter().copied().collect()
}

/// sum_i coefficients[i] * vectors[i]
fn combine(vectors: &[Vec<f64>], coefficients: &[f64], kernels: &dyn DenseKernels) -> Vec<f64> {
    let mut result = vec![0.0; vectors.first().map_or(0, Vec::len)];
    for (vector, &coefficient) in vectors.iter().zip(coefficients) {
        kernels.axpy(coefficient, vector, &mut result);
    }
    result
}

/// Two passes of Gram-Schmidt against `basis`, then normalization.
/// Returns false when nothing independent is left.
fn orthonormalize(candidate: &mut [f64], basis: &[Vec<f64>], kernels: &dyn DenseKernels) -> bool {
    let initial = frobenius_norm(candidate);
    if initial == 0.0 || !initial.is_finite() {
        return false;
    }
    kernels.scal(1.0 / initial, candidate);
    for _ in 0..2 {
        for vector in basis {
            let overlap = kernels.dot(vector, candidate);
            kernels.axpy(-overlap, vector, candidate);
        }
    }
    let norm = frobenius_norm(candidate);
    if norm < DEPENDENCE_THRESHOLD {
        return false;
    }
    kernels.scal(1.0 / norm, candidate);
    true
}
