//! Second-quantized operators and Green's functions
//!
//! The retarded single-particle Green's function
//!
//!   G(w) = <0| a_i [w - H + E0 + i eta]^-1 a+_j |0> + <0| a+_j [w + H - E0 + i eta]^-1 a_i |0>
//!
//! and the density response
//!
//!   X(w) = <0| dn_i [w - H + E0 + i eta]^-1 dn_j |0> - <0| dn_j [w + H - E0 + i eta]^-1 dn_i |0>
//!
//! with dn = n - <0|n|0>, are obtained from conjugate-gradient solves of the
//! shifted resolvent in the sector with one electron more or less.

extern crate nalgebra as na;

use super::fci::Fci;
use super::strings::{occupied, occupied_below, parity};
use color_eyre::eyre::{ensure, Result};
use hamiltonian::Integrals;
use na::DMatrix;
use num_complex::Complex64;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Spin {
    Up,
    Down,
}

impl FromStr for Spin {
    type Err = color_eyre::eyre::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" | "alpha" => Ok(Spin::Up),
            "down" | "beta" => Ok(Spin::Down),
            _ => Err(color_eyre::eyre::eyre!("Unknown spin: {}", s)),
        }
    }
}

impl fmt::Display for Spin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Spin::Up => write!(f, "up"),
            Spin::Down => write!(f, "down"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LadderOperator {
    Creator,
    Annihilator,
}

/// Which 2-RDMs a resolvent calculation should return
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RdmSelection {
    /// 2-RDM of the real part of the solution
    pub real: bool,
    /// 2-RDM of the imaginary part of the solution
    pub imag: bool,
    /// 2-RDM of the right-hand side (a+|0>, a|0> or dn|0>)
    pub dressed: bool,
}

impl RdmSelection {
    pub fn none() -> Self {
        RdmSelection::default()
    }

    pub fn all() -> Self {
        RdmSelection {
            real: true,
            imag: true,
            dressed: true,
        }
    }
}

/// 2-RDMs of one resolvent solve, present when requested and computed
#[derive(Debug, Default, Clone)]
pub struct ResolventRdms {
    pub real: Option<Vec<f64>>,
    pub imag: Option<Vec<f64>>,
    pub dressed: Option<Vec<f64>>,
}

/// Green's function block, entry (left, right)
#[derive(Debug, Clone)]
pub struct GfMatrix {
    pub values: DMatrix<Complex64>,
    /// One entry per right orbital
    pub rdms: Vec<ResolventRdms>,
}

/// A single Green's function element
#[derive(Debug, Clone)]
pub struct GfElement {
    pub value: Complex64,
    pub rdms: ResolventRdms,
}

impl GfMatrix {
    fn into_element(mut self) -> GfElement {
        GfElement {
            value: self.values[(0, 0)],
            rdms: self.rdms.pop().unwrap_or_default(),
        }
    }
}

impl Fci {
    /// result = n_orb source
    pub fn act_with_number_operator(&self, orb: usize, result: &mut [f64], source: &[f64]) {
        assert!(orb < self.num_orbitals, "act_with_number_operator: orbital out of range");
        let length = self.vec_length(0);
        assert_eq!(result.len(), length, "act_with_number_operator: result length");
        assert_eq!(source.len(), length, "act_with_number_operator: source length");

        result.par_iter_mut().enumerate().for_each(|(counter, value)| {
            let (up, down) = self.bitstrings_of_counter(0, counter);
            let occupation = u8::from(occupied(up, orb)) + u8::from(occupied(down, orb));
            *value = f64::from(occupation) * source[counter];
        });
    }

    /// this_vector = op_{orb,spin} other_vector
    ///
    /// `self` is the instance with the resulting particle numbers. Down-spin
    /// operators pick up (-1)^{nel_up} from moving past the up electrons. When
    /// the target irreps do not match the result is zero.
    pub fn act_with_second_quantized_operator(
        &self,
        op: LadderOperator,
        spin: Spin,
        orb: usize,
        this_vector: &mut [f64],
        other: &Fci,
        other_vector: &[f64],
    ) {
        assert!(orb < self.num_orbitals, "act_with_second_quantized_operator: orbital out of range");
        assert_eq!(other.num_orbitals, self.num_orbitals, "act_with_second_quantized_operator: orbital counts differ");
        assert_eq!(this_vector.len(), self.vec_length(0), "act_with_second_quantized_operator: result length");
        assert_eq!(other_vector.len(), other.vec_length(0), "act_with_second_quantized_operator: source length");

        if self.target_irrep != self.group.product(other.target_irrep, self.orbital_irreps[orb]) {
            this_vector.fill(0.0);
            return;
        }

        let start_phase = match spin {
            Spin::Up => 1.0,
            Spin::Down => parity(self.nel_up as u32),
        };
        let bit = 1 << orb;

        this_vector.par_iter_mut().enumerate().for_each(|(counter, value)| {
            let (up, down) = self.bitstrings_of_counter(0, counter);
            let string = match spin {
                Spin::Up => up,
                Spin::Down => down,
            };
            let source = match op {
                LadderOperator::Creator if occupied(string, orb) => Some(string & !bit),
                LadderOperator::Annihilator if !occupied(string, orb) => Some(string | bit),
                _ => None,
            };
            *value = match source {
                Some(source) => {
                    let phase = start_phase * parity(occupied_below(source, orb));
                    let coefficient = match spin {
                        Spin::Up => other.fci_coefficient(source, down, other_vector),
                        Spin::Down => other.fci_coefficient(up, source, other_vector),
                    };
                    phase * coefficient
                }
                None => 0.0,
            };
        });
    }

    /// GF[left, right] = <0| a_{left,spin} [alpha + beta H + i eta]^-1 a+_{right,spin} |0>
    #[allow(clippy::too_many_arguments)]
    pub fn gf_matrix_addition<H: Integrals + ?Sized>(
        &self,
        alpha: f64,
        beta: f64,
        eta: f64,
        orbs_left: &[usize],
        orbs_right: &[usize],
        spin: Spin,
        gs_vector: &[f64],
        ham: &H,
        rdms: RdmSelection,
    ) -> Result<GfMatrix> {
        self.gf_matrix(LadderOperator::Creator, alpha, beta, eta, orbs_left, orbs_right, spin, gs_vector, ham, rdms)
    }

    /// GF[left, right] = <0| a+_{left,spin} [alpha + beta H + i eta]^-1 a_{right,spin} |0>
    #[allow(clippy::too_many_arguments)]
    pub fn gf_matrix_removal<H: Integrals + ?Sized>(
        &self,
        alpha: f64,
        beta: f64,
        eta: f64,
        orbs_left: &[usize],
        orbs_right: &[usize],
        spin: Spin,
        gs_vector: &[f64],
        ham: &H,
        rdms: RdmSelection,
    ) -> Result<GfMatrix> {
        self.gf_matrix(LadderOperator::Annihilator, alpha, beta, eta, orbs_left, orbs_right, spin, gs_vector, ham, rdms)
    }

    #[allow(clippy::too_many_arguments)]
    fn gf_matrix<H: Integrals + ?Sized>(
        &self,
        op: LadderOperator,
        alpha: f64,
        beta: f64,
        eta: f64,
        orbs_left: &[usize],
        orbs_right: &[usize],
        spin: Spin,
        gs_vector: &[f64],
        ham: &H,
        rdms: RdmSelection,
    ) -> Result<GfMatrix> {
        let l = self.num_orbitals;
        assert!(!orbs_left.is_empty() && !orbs_right.is_empty(), "gf_matrix: empty orbital list");
        assert!(
            orbs_left.iter().chain(orbs_right).all(|&orb| orb < l),
            "gf_matrix: orbital out of range"
        );
        assert_eq!(gs_vector.len(), self.vec_length(0), "gf_matrix: ground-state length");

        let mut values = DMatrix::from_element(orbs_left.len(), orbs_right.len(), Complex64::new(0.0, 0.0));
        let mut all_rdms = vec![ResolventRdms::default(); orbs_right.len()];

        let nel_spin = match spin {
            Spin::Up => self.nel_up,
            Spin::Down => self.nel_down,
        };
        let possible = match op {
            LadderOperator::Creator => nel_spin < l,
            LadderOperator::Annihilator => nel_spin > 0,
        };
        if !possible {
            return Ok(GfMatrix { values, rdms: all_rdms });
        }

        let (nel_up, nel_down) = match (op, spin) {
            (LadderOperator::Creator, Spin::Up) => (self.nel_up + 1, self.nel_down),
            (LadderOperator::Creator, Spin::Down) => (self.nel_up, self.nel_down + 1),
            (LadderOperator::Annihilator, Spin::Up) => (self.nel_up - 1, self.nel_down),
            (LadderOperator::Annihilator, Spin::Down) => (self.nel_up, self.nel_down - 1),
        };

        for (col, &right) in orbs_right.iter().enumerate() {
            let right_irrep = self.orbital_irreps[right];
            if !orbs_left.iter().any(|&left| self.orbital_irreps[left] == right_irrep) {
                continue;
            }

            let sibling = self.sibling(ham, nel_up, nel_down, self.group.product(self.target_irrep, right_irrep))?;
            let length = sibling.vec_length(0);
            let mut dressed = vec![0.0; length];
            sibling.act_with_second_quantized_operator(op, spin, right, &mut dressed, self, gs_vector);

            let mut real = vec![0.0; length];
            let mut imag = vec![0.0; length];
            sibling.cg_solve_system(alpha, beta, eta, &dressed, &mut real, &mut imag, false)?;
            all_rdms[col] = sibling.resolvent_rdms(rdms, &real, &imag, &dressed)?;

            for (row, &left) in orbs_left.iter().enumerate() {
                if self.orbital_irreps[left] != right_irrep {
                    continue;
                }
                sibling.act_with_second_quantized_operator(op, spin, left, &mut dressed, self, gs_vector);
                values[(row, col)] = Complex64::new(sibling.dot(&dressed, &real), sibling.dot(&dressed, &imag));
            }
        }

        Ok(GfMatrix { values, rdms: all_rdms })
    }

    fn resolvent_rdms(
        &self,
        selection: RdmSelection,
        real: &[f64],
        imag: &[f64],
        dressed: &[f64],
    ) -> Result<ResolventRdms> {
        if selection != RdmSelection::none() {
            ensure!(
                self.nel_up + self.nel_down >= 2,
                "2-RDMs need at least two electrons, the resolvent sector has {}",
                self.nel_up + self.nel_down
            );
        }
        let size = self.num_orbitals.pow(4);
        let rdm_of = |wanted: bool, vector: &[f64]| {
            wanted.then(|| {
                let mut two_rdm = vec![0.0; size];
                self.fill_2rdm(vector, &mut two_rdm);
                two_rdm
            })
        };
        Ok(ResolventRdms {
            real: rdm_of(selection.real, real),
            imag: rdm_of(selection.imag, imag),
            dressed: rdm_of(selection.dressed, dressed),
        })
    }

    /// Addition amplitude <0| a_{alpha,spin} [w - H + E0 + i eta]^-1 a+_{beta,spin} |0>
    #[allow(clippy::too_many_arguments)]
    pub fn retarded_gf_addition<H: Integrals + ?Sized>(
        &self,
        omega: f64,
        eta: f64,
        orb_alpha: usize,
        orb_beta: usize,
        spin: Spin,
        gs_energy: f64,
        gs_vector: &[f64],
        ham: &H,
        rdms: RdmSelection,
    ) -> Result<GfElement> {
        let matrix = self.gf_matrix_addition(
            omega + gs_energy,
            -1.0,
            eta,
            &[orb_alpha],
            &[orb_beta],
            spin,
            gs_vector,
            ham,
            rdms,
        )?;
        Ok(matrix.into_element())
    }

    /// Removal amplitude <0| a+_{beta,spin} [w + H - E0 + i eta]^-1 a_{alpha,spin} |0>
    #[allow(clippy::too_many_arguments)]
    pub fn retarded_gf_removal<H: Integrals + ?Sized>(
        &self,
        omega: f64,
        eta: f64,
        orb_alpha: usize,
        orb_beta: usize,
        spin: Spin,
        gs_energy: f64,
        gs_vector: &[f64],
        ham: &H,
        rdms: RdmSelection,
    ) -> Result<GfElement> {
        let matrix = self.gf_matrix_removal(
            omega - gs_energy,
            1.0,
            eta,
            &[orb_beta],
            &[orb_alpha],
            spin,
            gs_vector,
            ham,
            rdms,
        )?;
        Ok(matrix.into_element())
    }

    /// G(w) = addition + removal amplitude
    #[allow(clippy::too_many_arguments)]
    pub fn retarded_gf<H: Integrals + ?Sized>(
        &self,
        omega: f64,
        eta: f64,
        orb_alpha: usize,
        orb_beta: usize,
        spin: Spin,
        gs_energy: f64,
        gs_vector: &[f64],
        ham: &H,
    ) -> Result<Complex64> {
        let addition = self.retarded_gf_addition(
            omega, eta, orb_alpha, orb_beta, spin, gs_energy, gs_vector, ham, RdmSelection::none(),
        )?;
        let removal = self.retarded_gf_removal(
            omega, eta, orb_alpha, orb_beta, spin, gs_energy, gs_vector, ham, RdmSelection::none(),
        )?;
        let value = addition.value + removal.value;
        self.observer()
            .greens_function("G", omega, eta, orb_alpha, orb_beta, value);
        Ok(value)
    }

    /// (n_orb - <0|n_orb|0>) |0>
    fn density_fluctuation(&self, orb: usize, gs_vector: &[f64]) -> Vec<f64> {
        let mut result = vec![0.0; gs_vector.len()];
        self.act_with_number_operator(orb, &mut result, gs_vector);
        let expectation = self.dot(&result, gs_vector);
        self.axpy(-expectation, gs_vector, &mut result);
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn density_amplitude(
        &self,
        alpha: f64,
        beta: f64,
        eta: f64,
        bra: &[f64],
        ket: &[f64],
        rdms: RdmSelection,
    ) -> Result<GfElement> {
        let length = self.vec_length(0);
        let mut real = vec![0.0; length];
        let mut imag = vec![0.0; length];
        self.cg_solve_system(alpha, beta, eta, ket, &mut real, &mut imag, false)?;
        Ok(GfElement {
            value: Complex64::new(self.dot(bra, &real), self.dot(bra, &imag)),
            rdms: self.resolvent_rdms(rdms, &real, &imag, ket)?,
        })
    }

    /// Forward amplitude <0| dn_alpha [w - H + E0 + i eta]^-1 dn_beta |0>
    #[allow(clippy::too_many_arguments)]
    pub fn density_response_gf_forward(
        &self,
        omega: f64,
        eta: f64,
        orb_alpha: usize,
        orb_beta: usize,
        gs_energy: f64,
        gs_vector: &[f64],
        rdms: RdmSelection,
    ) -> Result<GfElement> {
        let l = self.num_orbitals;
        assert!(orb_alpha < l && orb_beta < l, "density_response_gf_forward: orbital out of range");
        let density_alpha = self.density_fluctuation(orb_alpha, gs_vector);
        let density_beta = self.density_fluctuation(orb_beta, gs_vector);
        self.density_amplitude(omega + gs_energy, -1.0, eta, &density_alpha, &density_beta, rdms)
    }

    /// Backward amplitude <0| dn_beta [w + H - E0 + i eta]^-1 dn_alpha |0>
    #[allow(clippy::too_many_arguments)]
    pub fn density_response_gf_backward(
        &self,
        omega: f64,
        eta: f64,
        orb_alpha: usize,
        orb_beta: usize,
        gs_energy: f64,
        gs_vector: &[f64],
        rdms: RdmSelection,
    ) -> Result<GfElement> {
        let l = self.num_orbitals;
        assert!(orb_alpha < l && orb_beta < l, "density_response_gf_backward: orbital out of range");
        let density_alpha = self.density_fluctuation(orb_alpha, gs_vector);
        let density_beta = self.density_fluctuation(orb_beta, gs_vector);
        self.density_amplitude(omega - gs_energy, 1.0, eta, &density_beta, &density_alpha, rdms)
    }

    /// X(w) = forward - backward amplitude
    pub fn density_response_gf(
        &self,
        omega: f64,
        eta: f64,
        orb_alpha: usize,
        orb_beta: usize,
        gs_energy: f64,
        gs_vector: &[f64],
    ) -> Result<Complex64> {
        let forward = self.density_response_gf_forward(
            omega, eta, orb_alpha, orb_beta, gs_energy, gs_vector, RdmSelection::none(),
        )?;
        let backward = self.density_response_gf_backward(
            omega, eta, orb_alpha, orb_beta, gs_energy, gs_vector, RdmSelection::none(),
        )?;
        let value = forward.value - backward.value;
        self.observer()
            .greens_function("X", omega, eta, orb_alpha, orb_beta, value);
        Ok(value)
    }
}
