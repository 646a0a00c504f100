//! Dense linear-algebra kernels over flat `f64` buffers
//!
//! The FCI core only talks to a [`DenseKernels`] implementation, so the
//! numerical backend can be swapped without touching the index arithmetic.
//! Matrices are column-major, like BLAS.

extern crate nalgebra as na;

use na::{DMatrixView, DMatrixViewMut, DVectorView};
use rand::Rng;

pub trait DenseKernels: Send + Sync {
    /// x . y
    fn dot(&self, x: &[f64], y: &[f64]) -> f64;

    /// y += alpha * x
    fn axpy(&self, alpha: f64, x: &[f64], y: &mut [f64]);

    /// x *= alpha
    fn scal(&self, alpha: f64, x: &mut [f64]);

    /// dest = source
    fn copy(&self, source: &[f64], dest: &mut [f64]);

    /// C = alpha * op(A) * B + beta * C with C m x n and op(A) m x k.
    /// With `transpose_a` A is stored as a k x m matrix.
    #[allow(clippy::too_many_arguments)]
    fn gemm(
        &self,
        transpose_a: bool,
        m: usize,
        n: usize,
        k: usize,
        alpha: f64,
        a: &[f64],
        b: &[f64],
        beta: f64,
        c: &mut [f64],
    );
}

/// Kernels backed by nalgebra views on the caller's buffers
#[derive(Debug, Default, Clone, Copy)]
pub struct NalgebraKernels;

impl DenseKernels for NalgebraKernels {
    fn dot(&self, x: &[f64], y: &[f64]) -> f64 {
        assert_eq!(x.len(), y.len(), "dot: length mismatch");
        DVectorView::from_slice(x, x.len()).dot(&DVectorView::from_slice(y, y.len()))
    }

    fn axpy(&self, alpha: f64, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), y.len(), "axpy: length mismatch");
        for (yi, xi) in y.iter_mut().zip(x) {
            *yi += alpha * xi;
        }
    }

    fn scal(&self, alpha: f64, x: &mut [f64]) {
        x.iter_mut().for_each(|xi| *xi *= alpha);
    }

    fn copy(&self, source: &[f64], dest: &mut [f64]) {
        dest.copy_from_slice(source);
    }

    fn gemm(
        &self,
        transpose_a: bool,
        m: usize,
        n: usize,
        k: usize,
        alpha: f64,
        a: &[f64],
        b: &[f64],
        beta: f64,
        c: &mut [f64],
    ) {
        let b = DMatrixView::from_slice(&b[..k * n], k, n);
        let mut c = DMatrixViewMut::from_slice(&mut c[..m * n], m, n);
        if transpose_a {
            let a = DMatrixView::from_slice(&a[..k * m], k, m);
            c.gemm_tr(alpha, &a, &b, beta);
        } else {
            let a = DMatrixView::from_slice(&a[..m * k], m, k);
            c.gemm(alpha, &a, &b, beta);
        }
    }
}

pub fn clear_vector(vector: &mut [f64]) {
    vector.fill(0.0);
}

/// Uniform random entries in [-1, 1)
pub fn fill_random<R: Rng + ?Sized>(vector: &mut [f64], rng: &mut R) {
    for value in vector.iter_mut() {
        *value = rng.gen_range(-1.0..1.0);
    }
}

pub fn frobenius_norm(vector: &[f64]) -> f64 {
    vector.iter().map(|x| x * x).sum::<f64>().sqrt()
}
