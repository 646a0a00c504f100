//! Ground state and shifted linear systems of an FCI instance

use super::fci::Fci;
use crate::linalg::{fill_random, frobenius_norm};
use crate::solver_impl::{ConjugateGradient, Davidson, DavidsonSettings, LinearOperator};
use color_eyre::eyre::{ensure, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Davidson settings; the residual tolerance is scaled by sqrt(vector length)
    pub davidson: DavidsonSettings,
    /// Step cap of every conjugate-gradient solve
    pub max_cg_iterations: Option<usize>,
    /// Seed of the random Davidson start vector
    pub seed: u64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        SolverSettings {
            davidson: DavidsonSettings::default(),
            max_cg_iterations: Some(5000),
            seed: 42,
        }
    }
}

/// H without the constant energy, seen as a linear operator
struct HamiltonianOperator<'a> {
    fci: &'a Fci,
}

impl LinearOperator for HamiltonianOperator<'_> {
    fn dimension(&self) -> usize {
        self.fci.vec_length(0)
    }

    fn apply(&self, input: &[f64], output: &mut [f64]) {
        self.fci.ham_times_vec(input, output);
    }

    fn diagonal(&self, diag: &mut [f64]) {
        self.fci.diag_ham(diag);
    }
}

impl Fci {
    /// Lowest eigenvalue of H, constant energy included
    ///
    /// Without a guess the Davidson run starts from a seeded random vector.
    /// With a guess the converged eigenvector is written back into it.
    pub fn ground_state(&self, guess: Option<&mut [f64]>) -> Result<f64> {
        let length = self.vec_length(0);
        ensure!(length > 0, "The FCI vector space of this symmetry sector is empty");

        let mut start = vec![0.0; length];
        match guess.as_deref() {
            Some(guess) => {
                assert_eq!(guess.len(), length, "ground_state: guess length");
                self.copy(guess, &mut start);
            }
            None => fill_random(&mut start, &mut StdRng::seed_from_u64(self.settings().seed)),
        }

        let base = &self.settings().davidson;
        let settings = DavidsonSettings {
            residual_tolerance: base.residual_tolerance * (length as f64).sqrt(),
            ..base.clone()
        };
        let result = Davidson::new(settings).solve(
            &HamiltonianOperator { fci: self },
            &start,
            self.kernels(),
            self.observer(),
        )?;

        if let Some(guess) = guess {
            self.copy(&result.eigenvector, guess);
        }
        let energy = result.eigenvalue + self.econst;
        self.observer()
            .davidson_converged(result.multiplications, energy);
        Ok(energy)
    }

    /// output = (alpha + beta H) input, constant energy included
    pub fn alpha_plus_beta_ham(&self, alpha: f64, beta: f64, input: &[f64], output: &mut [f64]) {
        self.ham_times_vec(input, output);
        let prefactor = alpha + beta * self.econst;
        for (out, &value) in output.iter_mut().zip(input) {
            *out = prefactor * value + beta * *out;
        }
    }

    /// precon = 1 / sqrt(diag[(alpha + beta H)^2 + eta^2])
    fn cg_diagonal_preconditioner(&self, alpha: f64, beta: f64, eta: f64) -> Vec<f64> {
        let length = self.vec_length(0);
        let mut diag = vec![0.0; length];
        let mut diag_squared = vec![0.0; length];
        self.diag_ham(&mut diag);
        self.diag_ham_squared(&mut diag_squared);

        let shifted = alpha + beta * self.econst;
        let factor1 = shifted * shifted + eta * eta;
        let factor2 = 2.0 * shifted * beta;
        let factor3 = beta * beta;
        diag.iter()
            .zip(&diag_squared)
            .map(|(&h, &h2)| 1.0 / (factor1 + factor2 * h + factor3 * h2).sqrt())
            .collect()
    }

    /// Solve (alpha + beta H + i eta)(real + i imag) = rhs
    ///
    /// Conjugate gradient on the positive definite
    ///   P [(alpha + beta H)^2 + eta^2] P y = P (alpha + beta H - i eta) rhs,  x = P y
    /// with the Jacobi preconditioner P. The imaginary part is solved first and
    /// seeds the real part through real = -(alpha + beta H) imag / eta.
    #[allow(clippy::too_many_arguments)]
    pub fn cg_solve_system(
        &self,
        alpha: f64,
        beta: f64,
        eta: f64,
        rhs: &[f64],
        real: &mut [f64],
        imag: &mut [f64],
        check: bool,
    ) -> Result<()> {
        assert!(eta.abs() > 0.0, "cg_solve_system needs a nonzero eta");
        let length = self.vec_length(0);
        assert_eq!(rhs.len(), length, "cg_solve_system: rhs length");
        assert_eq!(real.len(), length, "cg_solve_system: real part length");
        assert_eq!(imag.len(), length, "cg_solve_system: imaginary part length");

        let precon = self.cg_diagonal_preconditioner(alpha, beta, eta);
        let threshold = 100.0 * self.settings().davidson.residual_tolerance * (length as f64).sqrt();
        let cutoff = self.settings().davidson.precond_cutoff;
        let solver = ConjugateGradient::new(threshold, self.settings().max_cg_iterations);

        let mut temp = vec![0.0; length];
        let mut temp2 = vec![0.0; length];
        let mut operator = |input: &[f64], output: &mut [f64]| {
            for ((t, &p), &x) in temp.iter_mut().zip(&precon).zip(input) {
                *t = p * x;
            }
            self.alpha_plus_beta_ham(alpha, beta, &temp, &mut temp2);
            self.alpha_plus_beta_ham(alpha, beta, &temp2, output);
            self.axpy(eta * eta, &temp, output);
            for (out, &p) in output.iter_mut().zip(&precon) {
                *out *= p;
            }
        };

        // imaginary part: P Op P y = -eta P rhs, guess y = -eta P rhs
        let mut residual: Vec<f64> = rhs.iter().zip(&precon).map(|(&b, &p)| -eta * p * b).collect();
        self.observer()
            .cg_start(frobenius_norm(&residual), threshold);
        self.copy(&residual, imag);
        solver.solve(&mut operator, imag, &mut residual, self.kernels(), self.observer())?;
        for (x, &p) in imag.iter_mut().zip(&precon) {
            *x *= p;
        }

        // real part: P Op P y = P (alpha + beta H) rhs
        self.alpha_plus_beta_ham(-alpha / eta, -beta / eta, imag, real);
        for (x, &p) in real.iter_mut().zip(&precon) {
            *x /= if p.abs() > cutoff { p } else { cutoff };
        }
        self.alpha_plus_beta_ham(alpha, beta, rhs, &mut residual);
        for (r, &p) in residual.iter_mut().zip(&precon) {
            *r *= p;
        }
        self.observer()
            .cg_start(frobenius_norm(&residual), threshold);
        solver.solve(&mut operator, real, &mut residual, self.kernels(), self.observer())?;
        for (x, &p) in real.iter_mut().zip(&precon) {
            *x *= p;
        }

        if check {
            let error = self.cg_residual_norm(alpha, beta, eta, rhs, real, imag);
            self.observer().cg_solution_check(error);
        }
        Ok(())
    }

    /// |(alpha + beta H + i eta)(real + i imag) - rhs|, without preconditioner
    pub fn cg_residual_norm(
        &self,
        alpha: f64,
        beta: f64,
        eta: f64,
        rhs: &[f64],
        real: &[f64],
        imag: &[f64],
    ) -> f64 {
        let length = self.vec_length(0);
        let mut real_error = vec![0.0; length];
        let mut imag_error = vec![0.0; length];

        // (alpha + beta H) real - eta imag - rhs
        self.alpha_plus_beta_ham(alpha, beta, real, &mut real_error);
        self.axpy(-eta, imag, &mut real_error);
        self.axpy(-1.0, rhs, &mut real_error);

        // (alpha + beta H) imag + eta real
        self.alpha_plus_beta_ham(alpha, beta, imag, &mut imag_error);
        self.axpy(eta, real, &mut imag_error);

        (self.dot(&real_error, &real_error) + self.dot(&imag_error, &imag_error)).sqrt()
    }
}
