//! Occupation strings of one spin channel and their dense counters

use hamiltonian::PointGroup;

/// Occupation pattern of one spin channel, bit i = orbital i
pub type Bitstring = u32;

/// Largest number of orbitals a [`Bitstring`] can hold
pub const MAX_ORBITALS: usize = Bitstring::BITS as usize;

const NO_COUNTER: u32 = u32::MAX;

/// Bijection between the strings with a fixed particle number and
/// per-irrep counters, assigned in ascending bitstring order
#[derive(Debug, Clone)]
pub struct StringSpace {
    num_electrons: usize,
    /// Counter of every bitstring, NO_COUNTER for a wrong particle number
    str_to_cnt: Vec<u32>,
    /// Bitstrings per irrep, indexed by counter
    cnt_to_str: Vec<Vec<Bitstring>>,
}

impl StringSpace {
    pub fn new(group: PointGroup, orbital_irreps: &[usize], num_electrons: usize) -> Self {
        let num_orbitals = orbital_irreps.len();
        assert!(num_orbitals <= MAX_ORBITALS);
        let num_strings = 1usize << num_orbitals;

        let mut str_to_cnt = vec![NO_COUNTER; num_strings];
        let mut cnt_to_str = vec![Vec::new(); group.num_irreps()];
        for bits in 0..num_strings {
            let string = bits as Bitstring;
            if string.count_ones() as usize != num_electrons {
                continue;
            }
            let irrep = string_irrep(group, orbital_irreps, string);
            str_to_cnt[bits] = cnt_to_str[irrep].len() as u32;
            cnt_to_str[irrep].push(string);
        }

        StringSpace {
            num_electrons,
            str_to_cnt,
            cnt_to_str,
        }
    }

    pub fn num_electrons(&self) -> usize {
        self.num_electrons
    }

    /// Number of strings of the given irrep
    #[inline]
    pub fn count(&self, irrep: usize) -> usize {
        self.cnt_to_str[irrep].len()
    }

    pub fn counts(&self) -> Vec<usize> {
        self.cnt_to_str.iter().map(Vec::len).collect()
    }

    #[inline]
    pub fn bitstring(&self, irrep: usize, counter: usize) -> Bitstring {
        self.cnt_to_str[irrep][counter]
    }

    /// Counter of a bitstring inside its own irrep
    #[inline]
    pub fn counter(&self, string: Bitstring) -> Option<usize> {
        match self.str_to_cnt.get(string as usize) {
            Some(&cnt) if cnt != NO_COUNTER => Some(cnt as usize),
            _ => None,
        }
    }
}

/// Direct product of the irreps of the occupied orbitals
#[inline]
pub fn string_irrep(group: PointGroup, orbital_irreps: &[usize], string: Bitstring) -> usize {
    orbital_irreps
        .iter()
        .enumerate()
        .filter(|(orb, _)| occupied(string, *orb))
        .fold(0, |irrep, (_, &orb_irrep)| group.product(irrep, orb_irrep))
}

#[inline]
pub fn occupied(string: Bitstring, orbital: usize) -> bool {
    (string >> orbital) & 1 == 1
}

/// Number of occupied orbitals with index below `orbital`
#[inline]
pub fn occupied_below(string: Bitstring, orbital: usize) -> u32 {
    (string & ((1 << orbital) - 1)).count_ones()
}

/// Number of occupied orbitals strictly between `a` and `b`
#[inline]
pub fn occupied_between(string: Bitstring, a: usize, b: usize) -> u32 {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    if hi <= lo + 1 {
        return 0;
    }
    occupied_below(string, hi) - occupied_below(string, lo + 1)
}

/// (-1)^n
#[inline]
pub fn parity(n: u32) -> f64 {
    if n % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}
