//! Knowles-Handy Hamiltonian-vector product
//!
//! With G_ij = T_ij - 1/2 sum_k (ik|kj) the Hamiltonian reads
//!
//!   H = sum_ij G_ij E_ij + 1/2 sum_ijkl (ij|kl) E_ij E_kl
//!
//! For every center irrep c the intermediate E_kl |in> is gathered into a
//! (pair x element) tile, contracted with the integrals of the pairs of c and
//! finally pushed back through E_ij. Only pairs with crea <= anni are stored;
//! the partner E_anni,crea is folded in while gathering and scattering.

use super::fci::{Fci, HxvWorkspace};
use super::sectors::{Address, CenterSector};
use rayon::prelude::*;
use std::sync::PoisonError;
use std::time::Instant;

impl Fci {
    /// output = H input, without the constant energy
    pub fn ham_times_vec(&self, input: &[f64], output: &mut [f64]) {
        let length = self.vec_length(0);
        assert_eq!(input.len(), length, "ham_times_vec: input length");
        assert_eq!(output.len(), length, "ham_times_vec: output length");
        let start = Instant::now();

        let mut guard = self.workspace.lock().unwrap_or_else(PoisonError::into_inner);
        let HxvWorkspace { work1, work2, updates } = &mut *guard;

        output.fill(0.0);

        for (center, sector) in self.sectors.iter().enumerate() {
            let num_pairs = sector.num_pairs();
            let sector_length = sector.len();
            if num_pairs == 0 || sector_length == 0 {
                continue;
            }

            let PairIntegrals { one_body, two_body } = &self.pair_integrals[center];

            let tile = (self.workspace_size / num_pairs).max(1);
            let mut first = 0;
            while first < sector_length {
                let last = (first + tile).min(sector_length);
                let width = last - first;
                let tile1 = &mut work1[..num_pairs * width];
                let tile2 = &mut work2[..num_pairs * width];

                self.gather_pairs(sector, input, first, tile1);
                if center == 0 {
                    self.kernels().gemm(
                        true,
                        width,
                        1,
                        num_pairs,
                        1.0,
                        tile1,
                        one_body,
                        1.0,
                        &mut output[first..last],
                    );
                }
                self.kernels().gemm(
                    false, num_pairs, width, num_pairs, 1.0, two_body, tile1, 0.0, tile2,
                );
                self.scatter_pairs(sector, tile2, first, last, output, updates);

                first = last;
            }
        }

        drop(guard);
        self.finished("ham_times_vec", start);
    }

    /// tile[pair + nP * (v - first)] = <v| E_crea,anni + E_anni,crea |input>
    /// for the vectors v of `sector`, the partner term only when anni > crea
    fn gather_pairs(&self, sector: &CenterSector, input: &[f64], first: usize, tile: &mut [f64]) {
        let target = &self.sectors[0];
        let num_pairs = sector.num_pairs();
        tile.par_chunks_mut(num_pairs)
            .enumerate()
            .for_each(|(offset, column)| {
                let addr = sector.locate(first + offset, &self.up);
                let irrep_down = self.group.product(addr.irrep_up, sector.local_target);
                for (value, &(crea, anni)) in column.iter_mut().zip(&sector.pairs) {
                    let mut result = self.excited_amplitude(target, input, addr, irrep_down, crea, anni);
                    if anni > crea {
                        result += self.excited_amplitude(target, input, addr, irrep_down, anni, crea);
                    }
                    *value = result;
                }
            });
    }

    /// <addr| E_crea,anni |source>, both spins, with `source` addressed by `origin`
    #[inline]
    fn excited_amplitude(
        &self,
        origin: &CenterSector,
        source: &[f64],
        addr: Address,
        irrep_down: usize,
        crea: usize,
        anni: usize,
    ) -> f64 {
        let mut result = 0.0;
        let up = self.lookup_up.get(addr.irrep_up, crea, anni, addr.cnt_up);
        if up.sign != 0 {
            let index = origin.index(up.irrep as usize, up.origin as usize, addr.cnt_down, &self.up);
            result += f64::from(up.sign) * source[index];
        }
        let down = self.lookup_down.get(irrep_down, crea, anni, addr.cnt_down);
        if down.sign != 0 {
            let index = origin.index(addr.irrep_up, addr.cnt_up, down.origin as usize, &self.up);
            result += f64::from(down.sign) * source[index];
        }
        result
    }

    /// output += sum_pairs (E_crea,anni + E_anni,crea) tile, where the tile
    /// holds the elements first..last of the `sector` vector
    ///
    /// Each tile element is pushed through the transposed tables,
    /// <w|E_ij|v> = <v|E_ji|w>. Per pair the images are collected in parallel
    /// and added in order.
    fn scatter_pairs(
        &self,
        sector: &CenterSector,
        tile: &[f64],
        first: usize,
        last: usize,
        output: &mut [f64],
        updates: &mut Vec<(usize, f64)>,
    ) {
        let num_pairs = sector.num_pairs();
        for (pair, &(crea, anni)) in sector.pairs.iter().enumerate() {
            updates.clear();
            updates.par_extend((first..last).into_par_iter().flat_map_iter(|counter| {
                let addr = sector.locate(counter, &self.up);
                let irrep_down = self.group.product(addr.irrep_up, sector.local_target);
                let value = tile[pair + num_pairs * (counter - first)];
                let forward = self.transposed_images(addr, irrep_down, crea, anni);
                let backward = if anni > crea {
                    self.transposed_images(addr, irrep_down, anni, crea)
                } else {
                    [None, None]
                };
                forward
                    .into_iter()
                    .chain(backward)
                    .flatten()
                    .map(move |(index, sign)| (index, sign * value))
            }));
            for &(index, value) in updates.iter() {
                output[index] += value;
            }
        }
    }

    /// Target elements w with <w| E_crea,anni |addr> nonzero, as (index, sign),
    /// up spin first
    #[inline]
    fn transposed_images(
        &self,
        addr: Address,
        irrep_down: usize,
        crea: usize,
        anni: usize,
    ) -> [Option<(usize, f64)>; 2] {
        let target = &self.sectors[0];
        let up = self.lookup_up.get(addr.irrep_up, anni, crea, addr.cnt_up);
        let down = self.lookup_down.get(irrep_down, anni, crea, addr.cnt_down);
        [
            (up.sign != 0).then(|| {
                let index = target.index(up.irrep as usize, up.origin as usize, addr.cnt_down, &self.up);
                (index, f64::from(up.sign))
            }),
            (down.sign != 0).then(|| {
                let index = target.index(addr.irrep_up, addr.cnt_up, down.origin as usize, &self.up);
                (index, f64::from(down.sign))
            }),
        ]
    }
}

/// Integrals indexed by the pairs of one center irrep
#[derive(Debug, Clone)]
pub(crate) struct PairIntegrals {
    /// G_pair, used by center 0 only
    pub one_body: Vec<f64>,
    /// 1/2 (pair1|pair2) at pair1 + nP * pair2
    pub two_body: Vec<f64>,
}

impl PairIntegrals {
    pub fn new(sector: &CenterSector, gmat: &[f64], eri: &[f64], num_orbitals: usize) -> Self {
        let l = num_orbitals;
        let num_pairs = sector.num_pairs();
        let one_body = sector
            .pairs
            .iter()
            .map(|&(crea, anni)| gmat[crea + l * anni])
            .collect();
        let mut two_body = vec![0.0; num_pairs * num_pairs];
        for (p2, &(crea2, anni2)) in sector.pairs.iter().enumerate() {
            for (p1, &(crea1, anni1)) in sector.pairs.iter().enumerate() {
                two_body[p1 + num_pairs * p2] = 0.5 * eri[crea1 + l * (anni1 + l * (crea2 + l * anni2))];
            }
        }
        PairIntegrals { one_body, two_body }
    }
}
