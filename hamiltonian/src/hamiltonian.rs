//! Dense storage of one- and two-body integrals

extern crate nalgebra as na;

use crate::integrals::Integrals;
use crate::symmetry::PointGroup;
use color_eyre::eyre::{ensure, Result};
use na::DMatrix;
use tracing::info;

/// Hamiltonian with dense T and V tensors
#[derive(Debug, Clone)]
pub struct Hamiltonian {
    /// Number of spatial orbitals
    num_orbitals: usize,

    /// Abelian point group of the orbitals
    group: PointGroup,

    /// Irrep of every orbital
    orbital_irreps: Vec<usize>,

    /// Constant energy (nuclear repulsion, frozen core)
    econst: f64,

    /// One-body integrals T_ij
    tmat: DMatrix<f64>,

    /// Two-body integrals <ij|kl>, stored at i + L*(j + L*(k + L*l))
    vmat: Vec<f64>,
}

impl Hamiltonian {
    /// Create a Hamiltonian with all integrals zero
    pub fn new(group: PointGroup, orbital_irreps: Vec<usize>) -> Result<Self> {
        let num_orbitals = orbital_irreps.len();
        ensure!(num_orbitals > 0, "A Hamiltonian needs at least one orbital");
        for (orb, &irrep) in orbital_irreps.iter().enumerate() {
            ensure!(
                irrep < group.num_irreps(),
                "Orbital {} has irrep {} but point group {} only has {} irreps",
                orb,
                irrep,
                group,
                group.num_irreps()
            );
        }

        Ok(Hamiltonian {
            num_orbitals,
            group,
            orbital_irreps,
            econst: 0.0,
            tmat: DMatrix::zeros(num_orbitals, num_orbitals),
            vmat: vec![0.0; num_orbitals.pow(4)],
        })
    }

    /// One-dimensional Hubbard model in the site basis (C1 symmetry)
    ///
    /// T_{i,i+1} = T_{i+1,i} = -t and <ii|ii> = U. With `periodic` the last
    /// site also hops to the first one.
    pub fn hubbard_chain(sites: usize, hopping: f64, onsite: f64, periodic: bool) -> Self {
        assert!(sites > 0, "Hubbard chain needs at least one site");
        let mut ham = Hamiltonian {
            num_orbitals: sites,
            group: PointGroup::C1,
            orbital_irreps: vec![0; sites],
            econst: 0.0,
            tmat: DMatrix::zeros(sites, sites),
            vmat: vec![0.0; sites.pow(4)],
        };

        for site in 0..sites.saturating_sub(1) {
            ham.set_tmat(site, site + 1, -hopping);
        }
        if periodic && sites > 2 {
            ham.set_tmat(sites - 1, 0, -hopping);
        }
        for site in 0..sites {
            ham.set_vmat(site, site, site, site, onsite);
        }

        info!(
            "Hubbard chain: {} sites, t = {:.4}, U = {:.4}, periodic = {}",
            sites, hopping, onsite, periodic
        );
        ham
    }

    #[inline]
    fn vindex(&self, i: usize, j: usize, k: usize, l: usize) -> usize {
        let n = self.num_orbitals;
        i + n * (j + n * (k + n * l))
    }

    pub fn set_econst(&mut self, value: f64) {
        self.econst = value;
    }

    /// True when T_ij is allowed by symmetry
    pub fn tmat_allowed(&self, i: usize, j: usize) -> bool {
        self.orbital_irreps[i] == self.orbital_irreps[j]
    }

    /// True when <ij|kl> is allowed by symmetry
    pub fn vmat_allowed(&self, i: usize, j: usize, k: usize, l: usize) -> bool {
        let g = self.group;
        let irreps = &self.orbital_irreps;
        g.product(irreps[i], irreps[j]) == g.product(irreps[k], irreps[l])
    }

    /// Set T_ij and T_ji
    pub fn set_tmat(&mut self, i: usize, j: usize, value: f64) {
        assert!(
            self.tmat_allowed(i, j),
            "T({}, {}) couples orbitals of different irreps",
            i,
            j
        );
        self.tmat[(i, j)] = value;
        self.tmat[(j, i)] = value;
    }

    /// Set <ij|kl> and its seven partners for real orbitals
    pub fn set_vmat(&mut self, i: usize, j: usize, k: usize, l: usize, value: f64) {
        assert!(
            self.vmat_allowed(i, j, k, l),
            "V({}, {}, {}, {}) is forbidden by symmetry",
            i,
            j,
            k,
            l
        );
        let partners = [
            (i, j, k, l),
            (j, i, l, k),
            (k, l, i, j),
            (l, k, j, i),
            (k, j, i, l),
            (l, i, j, k),
            (i, l, k, j),
            (j, k, l, i),
        ];
        for (a, b, c, d) in partners {
            let index = self.vindex(a, b, c, d);
            self.vmat[index] = value;
        }
    }

    pub fn tmat(&self) -> &DMatrix<f64> {
        &self.tmat
    }

    pub fn orbital_irreps(&self) -> &[usize] {
        &self.orbital_irreps
    }
}

impl Integrals for Hamiltonian {
    fn num_orbitals(&self) -> usize {
        self.num_orbitals
    }

    fn group(&self) -> PointGroup {
        self.group
    }

    fn orbital_irrep(&self, orbital: usize) -> usize {
        self.orbital_irreps[orbital]
    }

    fn one_body(&self, i: usize, j: usize) -> f64 {
        self.tmat[(i, j)]
    }

    fn two_body(&self, i: usize, j: usize, k: usize, l: usize) -> f64 {
        self.vmat[self.vindex(i, j, k, l)]
    }

    fn constant_energy(&self) -> f64 {
        self.econst
    }
}
