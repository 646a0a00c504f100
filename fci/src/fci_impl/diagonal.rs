//! Closed-form diagonals of H and H^2, and Slater-Condon matrix elements

use super::fci::Fci;
use super::strings::{occupied, occupied_between, parity, Bitstring};
use rayon::prelude::*;
use std::time::Instant;

/// Per-thread scratch of the H^2 diagonal
struct SquaredScratch {
    bits_up: Vec<i32>,
    bits_down: Vec<i32>,
    /// (ij|kk)(n_k,up + n_k,down)
    jmat: Vec<f64>,
    /// (ik|kj) n_k,sigma
    k_reg_up: Vec<f64>,
    k_reg_down: Vec<f64>,
    /// (ik|kj)(1 - n_k,sigma)
    k_bar_up: Vec<f64>,
    k_bar_down: Vec<f64>,
}

impl SquaredScratch {
    fn new(l: usize) -> Self {
        SquaredScratch {
            bits_up: vec![0; l],
            bits_down: vec![0; l],
            jmat: vec![0.0; l * l],
            k_reg_up: vec![0.0; l * l],
            k_reg_down: vec![0.0; l * l],
            k_bar_up: vec![0.0; l * l],
            k_bar_down: vec![0.0; l * l],
        }
    }
}

fn unpack(string: Bitstring, bits: &mut [i32]) {
    for (orb, bit) in bits.iter_mut().enumerate() {
        *bit = i32::from(occupied(string, orb));
    }
}

impl Fci {
    /// diag[c] = <c|H|c> for every determinant of the FCI vector, no constant
    pub fn diag_ham(&self, diag: &mut [f64]) {
        assert_eq!(diag.len(), self.vec_length(0), "diag_ham: output length");
        diag.par_iter_mut().enumerate().for_each(|(counter, value)| {
            let (up, down) = self.bitstrings_of_counter(0, counter);
            *value = self.diagonal_element(up, down);
        });
    }

    fn diagonal_element(&self, up: Bitstring, down: Bitstring) -> f64 {
        let l = self.num_orbitals;
        let n_up = |orb: usize| f64::from(u8::from(occupied(up, orb)));
        let n_down = |orb: usize| f64::from(u8::from(occupied(down, orb)));

        let mut result = 0.0;
        for orb1 in 0..l {
            let n_tot1 = n_up(orb1) + n_down(orb1);
            result += n_tot1 * self.gmat(orb1, orb1);
            for orb2 in 0..l {
                let n_tot2 = n_up(orb2) + n_down(orb2);
                result += 0.5 * n_tot1 * n_tot2 * self.eri(orb1, orb1, orb2, orb2);
                result += 0.5
                    * (n_tot1 - n_up(orb1) * n_up(orb2) - n_down(orb1) * n_down(orb2))
                    * self.eri(orb1, orb2, orb2, orb1);
            }
        }
        result
    }

    /// output[c] = <c|H^2|c> for every determinant, no constant
    ///
    /// Wick's theorem on
    ///   H^2 = g_ij g_kl E_ij E_kl + 1/2 [g_ab (ij|kl) + (ab|ij) g_kl] E_ab E_ij E_kl
    ///       + 1/4 (ab|cd)(ij|kl) E_ab E_cd E_ij E_kl
    pub fn diag_ham_squared(&self, output: &mut [f64]) {
        assert_eq!(output.len(), self.vec_length(0), "diag_ham_squared: output length");
        let start = Instant::now();
        let l = self.num_orbitals;

        output.par_iter_mut().enumerate().for_each_init(
            || SquaredScratch::new(l),
            |scratch, (counter, value)| {
                let (up, down) = self.bitstrings_of_counter(0, counter);
                *value = self.diagonal_squared_element(up, down, scratch);
            },
        );

        self.finished("diag_ham_squared", start);
    }

    fn diagonal_squared_element(&self, up: Bitstring, down: Bitstring, scratch: &mut SquaredScratch) -> f64 {
        let l = self.num_orbitals;
        unpack(up, &mut scratch.bits_up);
        unpack(down, &mut scratch.bits_down);
        let SquaredScratch {
            bits_up,
            bits_down,
            jmat,
            k_reg_up,
            k_reg_down,
            k_bar_up,
            k_bar_down,
        } = scratch;
        let bits_up: &[i32] = bits_up;
        let bits_down: &[i32] = bits_down;

        for i in 0..l {
            for j in i..l {
                let (mut val_j, mut reg_up, mut reg_down, mut bar_up, mut bar_down) = (0.0, 0.0, 0.0, 0.0, 0.0);
                if self.orbital_irreps[i] == self.orbital_irreps[j] {
                    for k in 0..l {
                        let exchange = self.eri(i, k, k, j);
                        let (nku, nkd) = (f64::from(bits_up[k]), f64::from(bits_down[k]));
                        val_j += self.eri(i, j, k, k) * (nku + nkd);
                        reg_up += exchange * nku;
                        reg_down += exchange * nkd;
                        bar_up += exchange * (1.0 - nku);
                        bar_down += exchange * (1.0 - nkd);
                    }
                }
                for (matrix, value) in [
                    (&mut *jmat, val_j),
                    (&mut *k_reg_up, reg_up),
                    (&mut *k_reg_down, reg_down),
                    (&mut *k_bar_up, bar_up),
                    (&mut *k_bar_down, bar_down),
                ] {
                    matrix[i + l * j] = value;
                    matrix[j + l * i] = value;
                }
            }
        }

        let mut energy = 0.0;
        for i in 0..l {
            let (niu, nid) = (f64::from(bits_up[i]), f64::from(bits_down[i]));
            let num_i = niu + nid;
            energy += self.gmat(i, i) * num_i
                + 0.5 * (jmat[i + l * i] * num_i + k_bar_up[i + l * i] * niu + k_bar_down[i + l * i] * nid);
        }
        let mut result = energy * energy;

        for p in 0..l {
            for q in 0..l {
                if self.orbital_irreps[p] != self.orbital_irreps[q] {
                    continue;
                }
                let hop_up = bits_up[p] * (1 - bits_up[q]);
                let hop_down = bits_down[p] * (1 - bits_down[q]);
                let special = f64::from(hop_up + hop_down);
                let g_plus_j = self.gmat(p, q) + jmat[p + l * q];
                let cross_up = (k_bar_up[p + l * q] - k_reg_up[p + l * q]) * f64::from(hop_up);
                let cross_down = (k_bar_down[p + l * q] - k_reg_down[p + l * q]) * f64::from(hop_down);
                result += g_plus_j * (special * g_plus_j + cross_up + cross_down)
                    + 0.25 * (cross_up * cross_up + cross_down * cross_down);
            }
        }

        // 1/2 (ak|ci)^2 [a->k][c->i] - 1/2 (ak|ci)(ai|ck) [a->k, c->i same spin]
        for k in (0..l).filter(|&k| bits_up[k] + bits_down[k] < 2) {
            for a in 0..l {
                let ak_up = bits_up[a] * (1 - bits_up[k]);
                let ak_down = bits_down[a] * (1 - bits_down[k]);
                if ak_up + ak_down == 0 {
                    continue;
                }
                let irrep_ak = self.group.product(self.orbital_irreps[a], self.orbital_irreps[k]);
                for i in (0..l).filter(|&i| bits_up[i] + bits_down[i] < 2) {
                    let bar_i_up = 1 - bits_up[i];
                    let bar_i_down = 1 - bits_down[i];
                    let irrep_c = self.group.product(irrep_ak, self.orbital_irreps[i]);
                    for &c in &self.irrep_orbitals[irrep_c] {
                        let ic_up = bits_up[c] * bar_i_up;
                        let ic_down = bits_down[c] * bar_i_down;
                        let prefactor1 = f64::from((ic_up + ic_down) * (ak_up + ak_down));
                        let prefactor2 = f64::from(ak_up * ic_up + ak_down * ic_down);
                        let eri_akci = self.eri(a, k, c, i);
                        let eri_aick = self.eri(a, i, c, k);
                        result += 0.5 * eri_akci * (prefactor1 * eri_akci - prefactor2 * eri_aick);
                    }
                }
            }
        }

        result
    }

    /// Counter of the determinant with the lowest diagonal energy, first one on ties
    pub fn lowest_energy_determinant(&self) -> usize {
        let mut energies = vec![0.0; self.vec_length(0)];
        self.diag_ham(&mut energies);
        let mut lowest = 0;
        for (counter, &energy) in energies.iter().enumerate().skip(1) {
            if energy < energies[lowest] {
                lowest = counter;
            }
        }
        lowest
    }

    /// <bra|H|ket> by the Slater-Condon rules, no constant
    pub fn matrix_element(
        &self,
        bra_up: Bitstring,
        bra_down: Bitstring,
        ket_up: Bitstring,
        ket_down: Bitstring,
    ) -> f64 {
        let annih_up = (bra_up ^ ket_up) & ket_up;
        let creat_up = (bra_up ^ ket_up) & bra_up;
        let annih_down = (bra_down ^ ket_down) & ket_down;
        let creat_down = (bra_down ^ ket_down) & bra_down;

        let num_up = annih_up.count_ones();
        let num_down = annih_down.count_ones();
        if num_up != creat_up.count_ones() || num_down != creat_down.count_ones() || num_up + num_down > 2 {
            return 0.0;
        }

        let l = self.num_orbitals;
        let first = |bits: Bitstring| bits.trailing_zeros() as usize;
        let second = |bits: Bitstring| (bits & (bits - 1)).trailing_zeros() as usize;

        match (num_up, num_down) {
            (0, 0) => self.diagonal_element(ket_up, ket_down),
            (1, 0) | (0, 1) => {
                let (same, creat, annih) = if num_up == 1 {
                    (ket_up, creat_up, annih_up)
                } else {
                    (ket_down, creat_down, annih_down)
                };
                let (j, m) = (first(creat), first(annih));
                let mut result = self.gmat(j, m);
                for orb in 0..l {
                    let n_same = f64::from(u8::from(occupied(same, orb)));
                    let n_tot = f64::from(u8::from(occupied(ket_up, orb)) + u8::from(occupied(ket_down, orb)));
                    result += self.eri(j, orb, orb, m) * (0.5 - n_same) + self.eri(orb, orb, j, m) * n_tot;
                }
                result * parity(occupied_between(same, j, m))
            }
            (2, 0) | (0, 2) => {
                let (ket, bra, creat, annih) = if num_up == 2 {
                    (ket_up, bra_up, creat_up, annih_up)
                } else {
                    (ket_down, bra_down, creat_down, annih_down)
                };
                let (i, j) = (first(creat), second(creat));
                let (k, m) = (first(annih), second(annih));
                let result = self.eri(i, k, j, m) - self.eri(i, m, j, k);
                result * parity(occupied_between(ket, k, m) + occupied_between(bra, i, j))
            }
            (1, 1) => {
                let (i, j) = (first(creat_up), first(creat_down));
                let (k, m) = (first(annih_up), first(annih_down));
                self.eri(i, k, j, m) * parity(occupied_between(ket_up, i, k) + occupied_between(ket_down, j, m))
            }
            _ => 0.0,
        }
    }
}
