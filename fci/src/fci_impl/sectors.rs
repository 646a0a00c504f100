//! Addressing of the combined up x down vector space per center irrep
//!
//! For center irrep c the local target irrep is c x Target. The vector is a
//! concatenation of blocks in up-irrep order; the element of
//! (irrep_up, cnt_up, cnt_down) sits at
//! `jumps[irrep_up] + cnt_up + num_up[irrep_up] * cnt_down`.

use super::strings::StringSpace;
use hamiltonian::PointGroup;

#[derive(Debug, Clone)]
pub struct CenterSector {
    /// (creator <= annihilator) pairs whose irrep product is the center irrep
    pub pairs: Vec<(usize, usize)>,
    /// Block offsets, `num_irreps + 1` entries
    pub jumps: Vec<usize>,
    /// c x Target
    pub local_target: usize,
}

/// Position of a vector element inside its block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address {
    pub irrep_up: usize,
    pub cnt_up: usize,
    pub cnt_down: usize,
}

impl CenterSector {
    pub fn new(
        group: PointGroup,
        orbital_irreps: &[usize],
        center: usize,
        target: usize,
        up: &StringSpace,
        down: &StringSpace,
    ) -> Self {
        let l = orbital_irreps.len();
        let pairs = (0..l)
            .flat_map(|crea| (crea..l).map(move |anni| (crea, anni)))
            .filter(|&(crea, anni)| group.product(orbital_irreps[crea], orbital_irreps[anni]) == center)
            .collect();

        let local_target = group.product(center, target);
        let mut jumps = Vec::with_capacity(group.num_irreps() + 1);
        jumps.push(0);
        for irrep_up in 0..group.num_irreps() {
            let irrep_down = group.product(irrep_up, local_target);
            let last = jumps[irrep_up];
            jumps.push(last + up.count(irrep_up) * down.count(irrep_down));
        }

        CenterSector {
            pairs,
            jumps,
            local_target,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.jumps[self.jumps.len() - 1]
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_pairs(&self) -> usize {
        self.pairs.len()
    }

    /// Up irrep of the block that contains `counter`
    #[inline]
    pub fn up_irrep_of(&self, counter: usize) -> usize {
        let mut irrep_up = self.jumps.len() - 1;
        while counter < self.jumps[irrep_up - 1] {
            irrep_up -= 1;
        }
        irrep_up - 1
    }

    #[inline]
    pub fn locate(&self, counter: usize, up: &StringSpace) -> Address {
        let irrep_up = self.up_irrep_of(counter);
        let num_up = up.count(irrep_up);
        let offset = counter - self.jumps[irrep_up];
        Address {
            irrep_up,
            cnt_up: offset % num_up,
            cnt_down: offset / num_up,
        }
    }

    #[inline]
    pub fn index(&self, irrep_up: usize, cnt_up: usize, cnt_down: usize, up: &StringSpace) -> usize {
        self.jumps[irrep_up] + cnt_up + up.count(irrep_up) * cnt_down
    }
}

/// Elements per workspace buffer for the Hamiltonian-vector product
///
/// Returns (required, allocated): the size that fits every center in one
/// tile, and that size capped by `max_memory_mb` for two f64 buffers. The cap
/// never goes below the largest pair count so a tile holds at least one vector
/// element.
pub fn workspace_size(sectors: &[CenterSector], max_memory_mb: f64) -> (usize, usize) {
    let required = sectors
        .iter()
        .map(|s| s.num_pairs() * s.len())
        .max()
        .unwrap_or(0);
    let max_pairs = sectors.iter().map(CenterSector::num_pairs).max().unwrap_or(0);
    let budget = ((max_memory_mb * 1e6) / (2.0 * std::mem::size_of::<f64>() as f64)).ceil() as usize;
    let allocated = required.min(budget).max(max_pairs);
    (required, allocated)
}
