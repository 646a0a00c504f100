//! Abelian point groups
//!
//! Irreps are labelled 0..num_irreps-1 in the ordering used by Molpro and by
//! FCIDUMP files (ORBSYM - 1). In this ordering the direct product of two
//! irreps is the bitwise XOR of their labels, for every group below.

use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointGroup {
    C1,
    Ci,
    C2,
    Cs,
    D2,
    C2v,
    C2h,
    D2h,
}

impl PointGroup {
    pub const ALL: [PointGroup; 8] = [
        PointGroup::C1,
        PointGroup::Ci,
        PointGroup::C2,
        PointGroup::Cs,
        PointGroup::D2,
        PointGroup::C2v,
        PointGroup::C2h,
        PointGroup::D2h,
    ];

    pub fn num_irreps(&self) -> usize {
        match self {
            PointGroup::C1 => 1,
            PointGroup::Ci | PointGroup::C2 | PointGroup::Cs => 2,
            PointGroup::D2 | PointGroup::C2v | PointGroup::C2h => 4,
            PointGroup::D2h => 8,
        }
    }

    /// Direct product of two irreps.
    #[inline]
    pub fn product(&self, irrep1: usize, irrep2: usize) -> usize {
        debug_assert!(irrep1 < self.num_irreps() && irrep2 < self.num_irreps());
        irrep1 ^ irrep2
    }

    /// Full multiplication table, `table[a][b] = a x b`.
    pub fn product_table(&self) -> Vec<Vec<usize>> {
        let n = self.num_irreps();
        (0..n)
            .map(|a| (0..n).map(|b| self.product(a, b)).collect())
            .collect()
    }

    pub fn name(&self) -> &'static str {
        match self {
            PointGroup::C1 => "c1",
            PointGroup::Ci => "ci",
            PointGroup::C2 => "c2",
            PointGroup::Cs => "cs",
            PointGroup::D2 => "d2",
            PointGroup::C2v => "c2v",
            PointGroup::C2h => "c2h",
            PointGroup::D2h => "d2h",
        }
    }

    /// Mulliken label of an irrep (Molpro ordering).
    pub fn irrep_name(&self, irrep: usize) -> &'static str {
        let labels: &[&'static str] = match self {
            PointGroup::C1 => &["A"],
            PointGroup::Ci => &["Ag", "Au"],
            PointGroup::C2 => &["A", "B"],
            PointGroup::Cs => &["A'", "A''"],
            PointGroup::D2 => &["A", "B3", "B2", "B1"],
            PointGroup::C2v => &["A1", "B1", "B2", "A2"],
            PointGroup::C2h => &["Ag", "Au", "Bu", "Bg"],
            PointGroup::D2h => &["Ag", "B3u", "B2u", "B1g", "B1u", "B2g", "B3g", "Au"],
        };
        labels[irrep]
    }

    /// Smallest group able to label `num_irreps` irreps. Used when a file only
    /// carries irrep labels and no group name.
    pub fn smallest_with(num_irreps: usize) -> Option<PointGroup> {
        match num_irreps {
            0 | 1 => Some(PointGroup::C1),
            2 => Some(PointGroup::C2),
            3 | 4 => Some(PointGroup::C2v),
            5..=8 => Some(PointGroup::D2h),
            _ => None,
        }
    }
}

impl fmt::Display for PointGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for PointGroup {
    type Err = color_eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        PointGroup::ALL
            .iter()
            .copied()
            .find(|group| group.name() == lower)
            .ok_or_else(|| eyre!("Unknown point group '{}'", s))
    }
}
