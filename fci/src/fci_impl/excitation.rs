use super::fci::Fci;
use rayon::prelude::*;

impl Fci {
    /// result = E_crea,anni orig, summed over both spins
    ///
    /// `orig` lives in the sector with target irrep `orig_target_irrep`, the
    /// result in the sector with target irrep orig_target x I_crea x I_anni.
    pub fn apply_excitation(
        &self,
        orig: &[f64],
        result: &mut [f64],
        crea: usize,
        anni: usize,
        orig_target_irrep: usize,
    ) {
        let l = self.num_orbitals;
        assert!(crea < l && anni < l, "apply_excitation: orbital index out of range");
        let group = self.group;
        let excitation_irrep = group.product(self.orbital_irreps[crea], self.orbital_irreps[anni]);
        let result_target = group.product(excitation_irrep, orig_target_irrep);
        let orig_sector = &self.sectors[group.product(self.target_irrep, orig_target_irrep)];
        let result_sector = &self.sectors[group.product(self.target_irrep, result_target)];
        assert_eq!(orig.len(), orig_sector.len(), "apply_excitation: input length");
        assert_eq!(result.len(), result_sector.len(), "apply_excitation: output length");

        let mut rest = result;
        for irrep_up in 0..group.num_irreps() {
            let block_length = result_sector.jumps[irrep_up + 1] - result_sector.jumps[irrep_up];
            let (block, tail) = std::mem::take(&mut rest).split_at_mut(block_length);
            rest = tail;
            if block_length == 0 {
                continue;
            }
            let irrep_down = group.product(irrep_up, result_target);

            block.par_chunks_mut(self.up.count(irrep_up))
                .enumerate()
                .for_each(|(cnt_down, row)| {
                    let down = self.lookup_down.get(irrep_down, crea, anni, cnt_down);
                    for (cnt_up, value) in row.iter_mut().enumerate() {
                        let mut amplitude = 0.0;
                        let up = self.lookup_up.get(irrep_up, crea, anni, cnt_up);
                        if up.sign != 0 {
                            let index = orig_sector.index(up.irrep as usize, up.origin as usize, cnt_down, &self.up);
                            amplitude += f64::from(up.sign) * orig[index];
                        }
                        if down.sign != 0 {
                            let index = orig_sector.index(irrep_up, cnt_up, down.origin as usize, &self.up);
                            amplitude += f64::from(down.sign) * orig[index];
                        }
                        *value = amplitude;
                    }
                });
        }
    }
}
