//! Reduced density matrices and <S^2>
//!
//! All expectation values are built from chains of `apply_excitation`
//! through the intermediate center sectors, then dotted with the FCI vector.

use super::fci::Fci;
use rayon::prelude::*;
use std::time::Instant;

/// Vector elements per partial sum of <S^2>
const REDUCTION_CHUNK: usize = 1024;

impl Fci {
    fn max_vec_length(&self) -> usize {
        self.sectors.iter().map(|s| s.len()).max().unwrap_or(0)
    }

    /// Two-particle reduced density matrix
    ///
    /// Gamma_ijkl = <E_ik E_jl> - delta_jk <E_il>, stored at i + L(j + L(k + L l)).
    /// Returns the energy evaluated with the density matrix, constant included.
    pub fn fill_2rdm(&self, vector: &[f64], two_rdm: &mut [f64]) -> f64 {
        assert!(self.nel_up + self.nel_down >= 2, "fill_2rdm needs at least two electrons");
        let l = self.num_orbitals;
        assert_eq!(vector.len(), self.vec_length(0), "fill_2rdm: vector length");
        assert_eq!(two_rdm.len(), l.pow(4), "fill_2rdm: buffer length");
        let start = Instant::now();

        let irreps = &self.orbital_irreps;
        let group = self.group;
        let idx = |i: usize, j: usize, k: usize, m: usize| i + l * (j + l * (k + l * m));

        two_rdm.fill(0.0);
        let length0 = self.vec_length(0);
        let mut work1 = vec![0.0; self.max_vec_length()];
        let mut work2 = vec![0.0; length0];

        for center1 in 0..group.num_irreps() {
            let length1 = self.vec_length(center1);
            let target1 = group.product(self.target_irrep, center1);

            for anni1 in 0..l {
                for crea1 in anni1..l {
                    let prod1 = group.product(irreps[crea1], irreps[anni1]);
                    if prod1 != center1 {
                        continue;
                    }
                    let work1 = &mut work1[..length1];
                    self.apply_excitation(vector, work1, crea1, anni1, self.target_irrep);

                    if prod1 == 0 {
                        let value = self.dot(work1, vector);
                        for jk in anni1..l {
                            two_rdm[idx(crea1, jk, jk, anni1)] -= value;
                        }
                    }

                    for crea2 in anni1..l {
                        for anni2 in anni1..l {
                            if group.product(irreps[crea2], irreps[anni2]) != prod1 {
                                continue;
                            }
                            self.apply_excitation(work1, &mut work2, crea2, anni2, target1);
                            two_rdm[idx(crea2, crea1, anni2, anni1)] += self.dot(&work2, vector);
                        }
                    }
                }
            }
        }

        for anni1 in 0..l {
            for crea1 in anni1..l {
                let prod1 = group.product(irreps[crea1], irreps[anni1]);
                for crea2 in anni1..l {
                    for anni2 in anni1..l {
                        if group.product(irreps[crea2], irreps[anni2]) != prod1 {
                            continue;
                        }
                        let value = two_rdm[idx(crea2, crea1, anni2, anni1)];
                        two_rdm[idx(crea1, crea2, anni1, anni2)] = value;
                        two_rdm[idx(anni2, anni1, crea2, crea1)] = value;
                        two_rdm[idx(anni1, anni2, crea1, crea2)] = value;
                    }
                }
            }
        }

        let num_electrons = (self.nel_up + self.nel_down) as f64;
        let mut energy = self.econst;
        for orb1 in 0..l {
            for orb2 in 0..l {
                let mut exchange = 0.0;
                let mut partial_trace = 0.0;
                for orb3 in 0..l {
                    exchange += self.eri(orb1, orb3, orb3, orb2);
                    partial_trace += two_rdm[idx(orb1, orb3, orb2, orb3)];
                    for orb4 in 0..l {
                        energy += 0.5 * two_rdm[idx(orb1, orb2, orb3, orb4)] * self.eri(orb1, orb3, orb2, orb4);
                    }
                }
                energy += (self.gmat(orb1, orb2) + 0.5 * exchange) * partial_trace / (num_electrons - 1.0);
            }
        }

        self.finished("fill_2rdm", start);
        self.observer().rdm_energy(energy);
        energy
    }

    /// Three-particle reduced density matrix
    ///
    /// Gamma_ijk,lmn = <E_il E_jm E_kn> - delta_kl <E_jm E_in> - delta_jl <E_im E_kn>
    ///   - delta_km <E_il E_jn> + delta_kl delta_im <E_jn> + delta_jl delta_km <E_in>,
    /// stored at i + L(j + L(k + L(l + L(m + L n)))).
    pub fn fill_3rdm(&self, vector: &[f64], three_rdm: &mut [f64]) {
        assert!(self.nel_up + self.nel_down >= 3, "fill_3rdm needs at least three electrons");
        let l = self.num_orbitals;
        assert_eq!(vector.len(), self.vec_length(0), "fill_3rdm: vector length");
        assert_eq!(three_rdm.len(), l.pow(6), "fill_3rdm: buffer length");
        let start = Instant::now();

        let irreps = &self.orbital_irreps;
        let group = self.group;
        let idx = |i: usize, j: usize, k: usize, p: usize, q: usize, r: usize| {
            i + l * (j + l * (k + l * (p + l * (q + l * r))))
        };

        three_rdm.fill(0.0);
        let length0 = self.vec_length(0);
        let max_length = self.max_vec_length();
        let mut work1 = vec![0.0; max_length];
        let mut work2 = vec![0.0; max_length];
        let mut work3 = vec![0.0; length0];

        for center1 in 0..group.num_irreps() {
            let length1 = self.vec_length(center1);
            let target1 = group.product(self.target_irrep, center1);

            for anni1 in 0..l {
                for crea1 in anni1..l {
                    let prod1 = group.product(irreps[crea1], irreps[anni1]);
                    if prod1 != center1 {
                        continue;
                    }
                    let work1 = &mut work1[..length1];
                    self.apply_excitation(vector, work1, crea1, anni1, self.target_irrep);

                    if prod1 == 0 {
                        let value = self.dot(work1, vector);
                        for m in anni1..l {
                            for p in anni1..l {
                                three_rdm[idx(m, crea1, p, p, m, anni1)] += value;
                                three_rdm[idx(crea1, p, m, p, m, anni1)] += value;
                            }
                        }
                    }

                    for center2 in 0..group.num_irreps() {
                        let target2 = group.product(target1, center2);
                        let center3 = group.product(center1, center2);
                        let length2 = self.vec_length(center3);

                        for crea2 in anni1..l {
                            for anni2 in anni1..l {
                                if group.product(irreps[crea2], irreps[anni2]) != center2 {
                                    continue;
                                }
                                let work2 = &mut work2[..length2];
                                self.apply_excitation(work1, work2, crea2, anni2, target1);

                                if prod1 == center2 {
                                    let value = self.dot(work2, vector);
                                    for orb in anni1..l {
                                        three_rdm[idx(crea1, crea2, orb, orb, anni2, anni1)] -= value;
                                        three_rdm[idx(crea2, orb, crea1, orb, anni2, anni1)] -= value;
                                        three_rdm[idx(crea2, crea1, orb, anni2, orb, anni1)] -= value;
                                    }
                                }

                                for crea3 in crea2..l {
                                    for anni3 in anni1..l {
                                        if group.product(irreps[crea3], irreps[anni3]) != center3 {
                                            continue;
                                        }
                                        self.apply_excitation(work2, &mut work3, crea3, anni3, target2);
                                        three_rdm[idx(crea3, crea2, crea1, anni3, anni2, anni1)] +=
                                            self.dot(&work3, vector);
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }

        for anni1 in 0..l {
            for crea1 in anni1..l {
                let prod1 = group.product(irreps[crea1], irreps[anni1]);
                for crea2 in anni1..l {
                    let prod2 = group.product(prod1, irreps[crea2]);
                    for anni2 in anni1..l {
                        let prod3 = group.product(prod2, irreps[anni2]);
                        for crea3 in crea2..l {
                            let prod4 = group.product(prod3, irreps[crea3]);
                            for anni3 in (anni1..l).filter(|&orb| irreps[orb] == prod4) {
                                let (c1, c2, c3) = (crea1, crea2, crea3);
                                let (a1, a2, a3) = (anni1, anni2, anni3);
                                let value = three_rdm[idx(c3, c2, c1, a3, a2, a1)];
                                for (i, j, k, p, q, r) in [
                                    (c2, c3, c1, a2, a3, a1),
                                    (c2, c1, c3, a2, a1, a3),
                                    (c3, c1, c2, a3, a1, a2),
                                    (c1, c3, c2, a1, a3, a2),
                                    (c1, c2, c3, a1, a2, a3),
                                    (a3, a2, a1, c3, c2, c1),
                                    (a2, a3, a1, c2, c3, c1),
                                    (a2, a1, a3, c2, c1, c3),
                                    (a3, a1, a2, c3, c1, c2),
                                    (a1, a3, a2, c1, c3, c2),
                                    (a1, a2, a3, c1, c2, c3),
                                ] {
                                    three_rdm[idx(i, j, k, p, q, r)] = value;
                                }
                            }
                        }
                    }
                }
            }
        }

        self.finished("fill_3rdm", start);
    }

    /// <S^2> of an FCI vector
    pub fn spin_squared(&self, vector: &[f64]) -> f64 {
        assert_eq!(vector.len(), self.vec_length(0), "spin_squared: vector length");
        let l = self.num_orbitals;
        let target = &self.sectors[0];

        let element = |counter: usize| {
            let addr = target.locate(counter, &self.up);
            let irrep_down = self.group.product(addr.irrep_up, self.target_irrep);
            let coefficient = vector[counter];
            let squared = coefficient * coefficient;
            let spin_difference = |orb: usize| {
                f64::from(self.lookup_up.get(addr.irrep_up, orb, orb, addr.cnt_up).sign)
                    - f64::from(self.lookup_down.get(irrep_down, orb, orb, addr.cnt_down).sign)
            };

            let mut value = 0.0;
            for i in 0..l {
                let diff_ii = spin_difference(i);
                value += 0.75 * diff_ii * diff_ii * squared;
                for j in (i + 1)..l {
                    // Sz Sz
                    value += 0.5 * diff_ii * spin_difference(j) * squared;

                    let irrep_up_flipped = self.group.product(
                        addr.irrep_up,
                        self.group.product(self.orbital_irreps[i], self.orbital_irreps[j]),
                    );
                    // -(a+_i,up a_j,up)(a+_j,down a_i,down) and its partner
                    for (p, q) in [(i, j), (j, i)] {
                        let up = self.lookup_up.get(addr.irrep_up, p, q, addr.cnt_up);
                        let down = self.lookup_down.get(irrep_down, q, p, addr.cnt_down);
                        let sign = i32::from(up.sign) * i32::from(down.sign);
                        if sign != 0 {
                            let index = target.index(
                                irrep_up_flipped,
                                up.origin as usize,
                                down.origin as usize,
                                &self.up,
                            );
                            value -= f64::from(sign) * vector[index] * coefficient;
                        }
                    }
                }
            }
            value
        };

        // fixed chunks, summed in order
        let length = vector.len();
        let partial: Vec<f64> = (0..length.div_ceil(REDUCTION_CHUNK))
            .into_par_iter()
            .map(|chunk| {
                let last = ((chunk + 1) * REDUCTION_CHUNK).min(length);
                (chunk * REDUCTION_CHUNK..last).map(&element).sum::<f64>()
            })
            .collect();
        let result: f64 = partial.iter().sum();

        let intended = 0.5 * (self.nel_up as f64 - self.nel_down as f64).abs();
        self.observer().spin_squared(result, intended * (intended + 1.0));
        result
    }
}
