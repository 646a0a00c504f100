//! FCIDUMP reader and writer
//!
//! Format:
//!
//! ```text
//!  &FCI NORB=4,NELEC=4,MS2=0,
//!   ORBSYM=1,1,2,2,
//!   ISYM=1,
//!  &END
//!   0.6677  1 1 1 1
//!  -1.2500  1 1 0 0
//!   0.7137  0 0 0 0
//! ```
//!
//! Integral lines hold chemist-notation (ij|kl) with 1-based indices. `k = l = 0`
//! marks a one-body integral and `i = j = k = l = 0` the constant energy.
//! ORBSYM and ISYM are 1-based irrep labels in the XOR ordering.

use crate::hamiltonian::Hamiltonian;
use crate::integrals::Integrals;
use crate::symmetry::PointGroup;
use color_eyre::eyre::{bail, ensure, eyre, Result, WrapErr};
use itertools::Itertools;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Header of an FCIDUMP file
#[derive(Debug, Clone, PartialEq)]
pub struct FcidumpHeader {
    pub norb: usize,
    pub nelec: usize,
    /// 2 S_z = N_up - N_down
    pub ms2: i64,
    /// 0-based target irrep
    pub isym: usize,
    /// 0-based orbital irreps
    pub orbsym: Vec<usize>,
}

impl FcidumpHeader {
    pub fn nel_up(&self) -> usize {
        ((self.nelec as i64 + self.ms2) / 2) as usize
    }

    pub fn nel_down(&self) -> usize {
        ((self.nelec as i64 - self.ms2) / 2) as usize
    }
}

/// Read an FCIDUMP file from disk
pub fn read_fcidump<P: AsRef<Path>>(
    path: P,
    group: Option<PointGroup>,
) -> Result<(Hamiltonian, FcidumpHeader)> {
    let path = path.as_ref();
    info!("Reading FCIDUMP from: {}", path.display());
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Unable to read FCIDUMP file: {}", path.display()))?;
    parse_fcidump(&content, group)
        .wrap_err_with(|| format!("Failed to parse FCIDUMP file: {}", path.display()))
}

/// Parse the contents of an FCIDUMP file
///
/// Without an explicit `group` the smallest point group covering the ORBSYM
/// labels is used.
pub fn parse_fcidump(content: &str, group: Option<PointGroup>) -> Result<(Hamiltonian, FcidumpHeader)> {
    let mut header_text = String::new();
    let mut lines = content.lines();
    let mut header_closed = false;
    for line in lines.by_ref() {
        let trimmed = line.trim();
        let upper = trimmed.to_uppercase();
        if upper.starts_with("&END") || upper == "/" {
            header_closed = true;
            break;
        }
        if let Some(pos) = upper.find("&END") {
            header_text.push_str(&trimmed[..pos]);
            header_closed = true;
            break;
        }
        header_text.push_str(trimmed);
        header_text.push(',');
    }
    ensure!(header_closed, "FCIDUMP header is not terminated by &END");

    let fields = parse_namelist(&header_text)?;
    let norb: usize = required_field(&fields, "NORB")?;
    let nelec: usize = required_field(&fields, "NELEC")?;
    let ms2: i64 = optional_field(&fields, "MS2")?.unwrap_or(0);
    let isym: usize = optional_field(&fields, "ISYM")?.unwrap_or(1);
    ensure!(norb > 0, "NORB must be positive");
    ensure!(isym >= 1, "ISYM labels start at 1");

    let orbsym: Vec<usize> = match fields.get("ORBSYM") {
        Some(values) => {
            let labels = values
                .iter()
                .map(|v| v.parse::<usize>().map_err(|e| eyre!("Bad ORBSYM entry '{}': {}", v, e)))
                .collect::<Result<Vec<_>>>()?;
            ensure!(
                labels.len() == norb,
                "ORBSYM has {} entries for NORB = {}",
                labels.len(),
                norb
            );
            ensure!(labels.iter().all(|&l| l >= 1), "ORBSYM labels start at 1");
            labels.into_iter().map(|l| l - 1).collect()
        }
        None => vec![0; norb],
    };

    let max_label = orbsym.iter().copied().chain(std::iter::once(isym - 1)).max().unwrap_or(0);
    let group = match group {
        Some(group) => group,
        None => PointGroup::smallest_with(max_label + 1)
            .ok_or_else(|| eyre!("Irrep label {} exceeds D2h", max_label + 1))?,
    };
    ensure!(
        max_label < group.num_irreps(),
        "Irrep label {} does not exist in point group {}",
        max_label + 1,
        group
    );

    let mut ham = Hamiltonian::new(group, orbsym.clone())?;
    let mut econst = 0.0;
    for (lineno, line) in lines.enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        ensure!(
            tokens.len() == 5,
            "Integral line {} has {} fields: '{}'",
            lineno + 1,
            tokens.len(),
            line
        );
        let value = parse_fortran_float(tokens[0])?;
        let mut idx = [0usize; 4];
        for (slot, token) in idx.iter_mut().zip(&tokens[1..]) {
            *slot = token
                .parse::<usize>()
                .map_err(|e| eyre!("Bad index '{}' on line '{}': {}", token, line, e))?;
            ensure!(*slot <= norb, "Index {} exceeds NORB on line '{}'", slot, line);
        }

        match idx {
            [0, 0, 0, 0] => econst += value,
            [_, 0, 0, 0] => {} // orbital energies
            [i, j, 0, 0] if i > 0 && j > 0 => {
                let (i, j) = (i - 1, j - 1);
                if !ham.tmat_allowed(i, j) {
                    ensure!(value.abs() < 1e-12, "T({}, {}) = {} breaks symmetry", i + 1, j + 1, value);
                    continue;
                }
                ham.set_tmat(i, j, value);
            }
            [i, j, k, l] if i > 0 && j > 0 && k > 0 && l > 0 => {
                // (ij|kl) = <ik|jl>
                let (i, j, k, l) = (i - 1, j - 1, k - 1, l - 1);
                if !ham.vmat_allowed(i, k, j, l) {
                    ensure!(
                        value.abs() < 1e-12,
                        "({} {}|{} {}) = {} breaks symmetry",
                        i + 1,
                        j + 1,
                        k + 1,
                        l + 1,
                        value
                    );
                    continue;
                }
                ham.set_vmat(i, k, j, l, value);
            }
            _ => bail!("Unrecognised index pattern on line '{}'", line),
        }
    }
    ham.set_econst(econst);

    let header = FcidumpHeader {
        norb,
        nelec,
        ms2,
        isym: isym - 1,
        orbsym,
    };
    info!(
        "FCIDUMP: NORB = {}, NELEC = {}, MS2 = {}, group = {}",
        header.norb, header.nelec, header.ms2, group
    );
    Ok((ham, header))
}

/// Write a Hamiltonian in FCIDUMP format
///
/// Only the symmetry-unique (ij|kl) with i >= j, k >= l and ij >= kl are written.
pub fn write_fcidump<H: Integrals + ?Sized, W: Write>(
    writer: &mut W,
    ham: &H,
    nelec: usize,
    ms2: i64,
    isym: usize,
) -> Result<()> {
    let n = ham.num_orbitals();
    let orbsym = (0..n).map(|i| ham.orbital_irrep(i) + 1).join(",");
    writeln!(writer, " &FCI NORB={},NELEC={},MS2={},", n, nelec, ms2)?;
    writeln!(writer, "  ORBSYM={},", orbsym)?;
    writeln!(writer, "  ISYM={},", isym + 1)?;
    writeln!(writer, " &END")?;

    let pairs: Vec<(usize, usize)> = (0..n).flat_map(|i| (0..=i).map(move |j| (i, j))).collect();
    for (ij, &(i, j)) in pairs.iter().enumerate() {
        for &(k, l) in &pairs[..=ij] {
            let value = ham.two_body(i, k, j, l);
            if value != 0.0 {
                writeln!(writer, "{:24.16E} {:4} {:4} {:4} {:4}", value, i + 1, j + 1, k + 1, l + 1)?;
            }
        }
    }
    for &(i, j) in &pairs {
        let value = ham.one_body(i, j);
        if value != 0.0 {
            writeln!(writer, "{:24.16E} {:4} {:4} {:4} {:4}", value, i + 1, j + 1, 0, 0)?;
        }
    }
    writeln!(writer, "{:24.16E} {:4} {:4} {:4} {:4}", ham.constant_energy(), 0, 0, 0, 0)?;
    Ok(())
}

fn parse_namelist(text: &str) -> Result<HashMap<String, Vec<String>>> {
    let body = text.trim();
    let body = body
        .strip_prefix("&FCI")
        .or_else(|| body.strip_prefix("&fci"))
        .ok_or_else(|| eyre!("FCIDUMP header must start with &FCI"))?;

    let mut fields: HashMap<String, Vec<String>> = HashMap::new();
    let mut current: Option<String> = None;
    for token in body.split(|c: char| c == ',' || c.is_whitespace()) {
        if token.is_empty() {
            continue;
        }
        if let Some((key, value)) = token.split_once('=') {
            let key = key.trim().to_uppercase();
            let entry = fields.entry(key.clone()).or_default();
            if !value.is_empty() {
                entry.push(value.to_string());
            }
            current = Some(key);
        } else {
            let key = current
                .as_ref()
                .ok_or_else(|| eyre!("Value '{}' without a key in FCIDUMP header", token))?;
            fields.entry(key.clone()).or_default().push(token.to_string());
        }
    }
    Ok(fields)
}

fn optional_field<T: std::str::FromStr>(fields: &HashMap<String, Vec<String>>, key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match fields.get(key).and_then(|values| values.first()) {
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|e| eyre!("Bad value '{}' for {}: {}", value, key, e)),
        None => Ok(None),
    }
}

fn required_field<T: std::str::FromStr>(fields: &HashMap<String, Vec<String>>, key: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    optional_field(fields, key)?.ok_or_else(|| eyre!("FCIDUMP header lacks {}", key))
}

fn parse_fortran_float(token: &str) -> Result<f64> {
    token
        .replace(['D', 'd'], "E")
        .parse::<f64>()
        .map_err(|e| eyre!("Bad integral value '{}': {}", token, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const H2_LIKE: &str = " &FCI NORB=2,NELEC=2,MS2=0,
  ORBSYM=1,2,
  ISYM=1,
 &END
  0.6757101548  1  1  1  1
  0.1809312711  2  1  2  1
  0.6645817302  2  2  1  1
  0.6985682218  2  2  2  2
 -1.2563390730  1  1  0  0
 -0.4718960244  2  2  0  0
 -0.5  1  0  0  0
  0.7137539936  0  0  0  0
";

    #[test]
    fn test_parse_fcidump() {
        let (ham, header) = parse_fcidump(H2_LIKE, None).unwrap();
        assert_eq!(header.norb, 2);
        assert_eq!(header.nelec, 2);
        assert_eq!((header.nel_up(), header.nel_down()), (1, 1));
        assert_eq!(header.orbsym, vec![0, 1]);
        assert_eq!(ham.group(), PointGroup::C2);
        assert!((ham.constant_energy() - 0.7137539936).abs() < 1e-12);
        assert!((ham.one_body(0, 0) + 1.2563390730).abs() < 1e-12);
        // (22|11) = <21|21>
        assert!((ham.two_body(1, 0, 1, 0) - 0.6645817302).abs() < 1e-12);
        // (21|21) = <22|11> = <11|22>
        assert!((ham.two_body(0, 0, 1, 1) - 0.1809312711).abs() < 1e-12);
        assert!((ham.two_body(0, 1, 1, 0) - 0.1809312711).abs() < 1e-12);
    }

    #[test]
    fn test_write_then_parse_keeps_integrals() {
        let (ham, header) = parse_fcidump(H2_LIKE, Some(PointGroup::C2v)).unwrap();
        let mut buffer = Vec::new();
        write_fcidump(&mut buffer, &ham, header.nelec, header.ms2, header.isym).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let (again, _) = parse_fcidump(&text, Some(PointGroup::C2v)).unwrap();
        for i in 0..2 {
            for j in 0..2 {
                assert!((ham.one_body(i, j) - again.one_body(i, j)).abs() < 1e-14);
                for k in 0..2 {
                    for l in 0..2 {
                        assert!((ham.two_body(i, j, k, l) - again.two_body(i, j, k, l)).abs() < 1e-14);
                    }
                }
            }
        }
        assert!((ham.constant_energy() - again.constant_energy()).abs() < 1e-14);
    }

    #[test]
    fn test_reject_bad_headers() {
        assert!(parse_fcidump(" &FCI NORB=2,NELEC=2,\n", None).is_err());
        assert!(parse_fcidump(" &FCI NELEC=2, &END\n", None).is_err());
        assert!(parse_fcidump(" &FCI NORB=2,NELEC=2,ORBSYM=1, &END\n", None).is_err());
        assert!(parse_fcidump(" &FCI NORB=1,NELEC=2,ORBSYM=3, &END\n", Some(PointGroup::C2)).is_err());
    }
}
