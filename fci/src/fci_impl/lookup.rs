//! Single-excitation lookup tables
//!
//! For a destination string |dest> of irrep `irrep` and counter `cnt`, and an
//! ordered orbital pair (crea, anni), the entry at `crea + L*(anni + L*cnt)`
//! holds the origin string such that
//!
//!   sign |dest> = a+_crea a_anni |origin>
//!
//! Entries without an origin carry sign 0.

use super::strings::{occupied, occupied_below, parity, Bitstring, StringSpace};
use hamiltonian::PointGroup;
use rayon::prelude::*;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Excitation {
    /// Counter of the origin string
    pub origin: u32,
    /// Irrep of the origin string
    pub irrep: u8,
    /// Fermion phase, 0 when no origin exists
    pub sign: i8,
}

#[derive(Debug, Clone)]
pub struct ExcitationTable {
    num_orbitals: usize,
    /// Per destination irrep, L*L entries per destination counter
    entries: Vec<Vec<Excitation>>,
}

impl ExcitationTable {
    pub fn new(group: PointGroup, orbital_irreps: &[usize], space: &StringSpace) -> Self {
        let num_orbitals = orbital_irreps.len();
        let block = num_orbitals * num_orbitals;

        let entries = (0..group.num_irreps())
            .map(|irrep| {
                let mut table = vec![Excitation::default(); block * space.count(irrep)];
                if block > 0 {
                    table.par_chunks_mut(block).enumerate().for_each(|(cnt, row)| {
                        let dest = space.bitstring(irrep, cnt);
                        fill_row(group, orbital_irreps, space, irrep, dest, row);
                    });
                }
                table
            })
            .collect();

        ExcitationTable {
            num_orbitals,
            entries,
        }
    }

    /// Origin of `dest = E_{crea,anni} origin` for destination (irrep, counter)
    #[inline]
    pub fn get(&self, irrep: usize, crea: usize, anni: usize, counter: usize) -> Excitation {
        let l = self.num_orbitals;
        self.entries[irrep][crea + l * (anni + l * counter)]
    }
}

fn fill_row(
    group: PointGroup,
    orbital_irreps: &[usize],
    space: &StringSpace,
    irrep: usize,
    dest: Bitstring,
    row: &mut [Excitation],
) {
    let l = orbital_irreps.len();
    for crea in (0..l).filter(|&orb| occupied(dest, orb)) {
        let phase_crea = parity(occupied_below(dest, crea));
        let without_crea = dest & !(1 << crea);
        for anni in (0..l).filter(|&orb| !occupied(without_crea, orb)) {
            let phase_anni = parity(occupied_below(without_crea, anni));
            let origin = without_crea | (1 << anni);
            let origin_irrep = group.product(
                irrep,
                group.product(orbital_irreps[crea], orbital_irreps[anni]),
            );
            if let Some(cnt) = space.counter(origin) {
                row[crea + l * anni] = Excitation {
                    origin: cnt as u32,
                    irrep: origin_irrep as u8,
                    sign: (phase_crea * phase_anni) as i8,
                };
            }
        }
    }
}
