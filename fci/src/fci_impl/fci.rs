use super::hamiltonian_vector::PairIntegrals;
use super::lookup::ExcitationTable;
use super::sectors::{workspace_size, CenterSector};
use super::solvers::SolverSettings;
use super::strings::{string_irrep, Bitstring, StringSpace, MAX_ORBITALS};
use crate::linalg::{DenseKernels, NalgebraKernels};
use crate::observer::{FciObserver, StartupSummary, TracingObserver};
use color_eyre::eyre::{ensure, Result};
use hamiltonian::{Integrals, PointGroup};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Scratch tiles of the Hamiltonian-vector product
#[derive(Debug)]
pub(crate) struct HxvWorkspace {
    pub work1: Vec<f64>,
    pub work2: Vec<f64>,
    /// (index, value) images of one scatter pass
    pub updates: Vec<(usize, f64)>,
}

/// Collaborators injected into an [`Fci`] instance
#[derive(Clone)]
pub struct FciOptions {
    pub observer: Arc<dyn FciObserver>,
    pub kernels: Arc<dyn DenseKernels>,
    pub settings: SolverSettings,
}

impl Default for FciOptions {
    fn default() -> Self {
        FciOptions {
            observer: Arc::new(TracingObserver),
            kernels: Arc::new(NalgebraKernels),
            settings: SolverSettings::default(),
        }
    }
}

impl std::fmt::Debug for FciOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FciOptions")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// FCI solver for a fixed number of up and down electrons in a fixed target irrep
pub struct Fci {
    pub(crate) num_orbitals: usize,
    pub(crate) nel_up: usize,
    pub(crate) nel_down: usize,
    pub(crate) target_irrep: usize,
    pub(crate) group: PointGroup,
    pub(crate) orbital_irreps: Vec<usize>,
    /// Orbitals of every irrep
    pub(crate) irrep_orbitals: Vec<Vec<usize>>,

    pub(crate) econst: f64,
    /// T_ij - 1/2 sum_k (ik|kj), stored at i + L*j
    pub(crate) gmat: Vec<f64>,
    /// Chemist notation (ij|kl), stored at i + L*(j + L*(k + L*l))
    pub(crate) eri: Vec<f64>,

    pub(crate) up: StringSpace,
    pub(crate) down: StringSpace,
    pub(crate) lookup_up: ExcitationTable,
    pub(crate) lookup_down: ExcitationTable,
    /// One addressing table per center irrep
    pub(crate) sectors: Vec<CenterSector>,
    /// Pair-indexed integrals, one block per center irrep
    pub(crate) pair_integrals: Vec<PairIntegrals>,

    pub(crate) max_memory_mb: f64,
    pub(crate) workspace_size: usize,
    pub(crate) workspace: Mutex<HxvWorkspace>,

    pub(crate) options: FciOptions,
}

impl Fci {
    /// Build an instance with the default observer, kernels and solver settings
    pub fn new<H: Integrals + ?Sized>(
        ham: &H,
        nel_up: usize,
        nel_down: usize,
        target_irrep: usize,
        max_memory_mb: f64,
    ) -> Result<Self> {
        Self::with_options(ham, nel_up, nel_down, target_irrep, max_memory_mb, FciOptions::default())
    }

    pub fn with_options<H: Integrals + ?Sized>(
        ham: &H,
        nel_up: usize,
        nel_down: usize,
        target_irrep: usize,
        max_memory_mb: f64,
        options: FciOptions,
    ) -> Result<Self> {
        let start = Instant::now();
        let num_orbitals = ham.num_orbitals();
        let group = ham.group();
        let l = num_orbitals;

        ensure!(
            l <= MAX_ORBITALS,
            "FCI supports at most {} orbitals, got {}",
            MAX_ORBITALS,
            l
        );
        ensure!(
            nel_up <= l && nel_down <= l,
            "Cannot place ({}, {}) electrons in {} orbitals",
            nel_up,
            nel_down,
            l
        );
        ensure!(
            max_memory_mb > 0.0,
            "The workspace memory limit must be positive, got {} MB",
            max_memory_mb
        );
        ensure!(
            target_irrep < group.num_irreps(),
            "Target irrep {} out of range for point group {}",
            target_irrep,
            group
        );

        let orbital_irreps: Vec<usize> = (0..l).map(|orb| ham.orbital_irrep(orb)).collect();
        let mut irrep_orbitals = vec![Vec::new(); group.num_irreps()];
        for (orb, &irrep) in orbital_irreps.iter().enumerate() {
            irrep_orbitals[irrep].push(orb);
        }

        let mut eri = vec![0.0; l.pow(4)];
        for i in 0..l {
            for j in 0..l {
                for k in 0..l {
                    for m in 0..l {
                        eri[i + l * (j + l * (k + l * m))] = ham.two_body(i, k, j, m);
                    }
                }
            }
        }
        let mut gmat = vec![0.0; l * l];
        for i in 0..l {
            for j in 0..l {
                let exchange: f64 = (0..l).map(|k| eri[i + l * (k + l * (k + l * j))]).sum();
                gmat[i + l * j] = ham.one_body(i, j) - 0.5 * exchange;
            }
        }

        let up = StringSpace::new(group, &orbital_irreps, nel_up);
        let down = StringSpace::new(group, &orbital_irreps, nel_down);
        let lookup_up = ExcitationTable::new(group, &orbital_irreps, &up);
        let lookup_down = ExcitationTable::new(group, &orbital_irreps, &down);

        let sectors: Vec<CenterSector> = (0..group.num_irreps())
            .map(|center| CenterSector::new(group, &orbital_irreps, center, target_irrep, &up, &down))
            .collect();
        for (center, sector) in sectors.iter().enumerate() {
            ensure!(
                sector.len() <= i32::MAX as usize,
                "FCI vector of center irrep {} has {} elements, above the supported {}",
                center,
                sector.len(),
                i32::MAX
            );
        }

        let pair_integrals = sectors
            .iter()
            .map(|sector| PairIntegrals::new(sector, &gmat, &eri, num_orbitals))
            .collect();
        let (required, allocated) = workspace_size(&sectors, max_memory_mb);

        let fci = Fci {
            num_orbitals,
            nel_up,
            nel_down,
            target_irrep,
            group,
            orbital_irreps,
            irrep_orbitals,
            econst: ham.constant_energy(),
            gmat,
            eri,
            up,
            down,
            lookup_up,
            lookup_down,
            sectors,
            pair_integrals,
            max_memory_mb,
            workspace_size: allocated,
            workspace: Mutex::new(HxvWorkspace {
                work1: vec![0.0; allocated],
                work2: vec![0.0; allocated],
                updates: Vec::new(),
            }),
            options,
        };

        fci.options.observer.startup(&StartupSummary {
            num_orbitals,
            nel_up,
            nel_down,
            group,
            target_irrep,
            up_counts: fci.up.counts(),
            down_counts: fci.down.counts(),
            vec_length: fci.vec_length(0),
            required_workspace: required,
            workspace: allocated,
        });
        fci.finished("construction", start);

        Ok(fci)
    }

    pub fn with_observer(mut self, observer: Arc<dyn FciObserver>) -> Self {
        self.options.observer = observer;
        self
    }

    pub fn with_kernels(mut self, kernels: Arc<dyn DenseKernels>) -> Self {
        self.options.kernels = kernels;
        self
    }

    pub fn with_settings(mut self, settings: SolverSettings) -> Self {
        self.options.settings = settings;
        self
    }

    /// Instance over the same integrals with other particle numbers and target,
    /// sharing memory limit, observer, kernels and settings
    pub fn sibling<H: Integrals + ?Sized>(
        &self,
        ham: &H,
        nel_up: usize,
        nel_down: usize,
        target_irrep: usize,
    ) -> Result<Fci> {
        ensure!(
            ham.num_orbitals() == self.num_orbitals,
            "Sibling Hamiltonian has {} orbitals instead of {}",
            ham.num_orbitals(),
            self.num_orbitals
        );
        Fci::with_options(
            ham,
            nel_up,
            nel_down,
            target_irrep,
            self.max_memory_mb,
            self.options.clone(),
        )
    }

    pub fn num_orbitals(&self) -> usize {
        self.num_orbitals
    }

    pub fn nel_up(&self) -> usize {
        self.nel_up
    }

    pub fn nel_down(&self) -> usize {
        self.nel_down
    }

    pub fn target_irrep(&self) -> usize {
        self.target_irrep
    }

    pub fn group(&self) -> PointGroup {
        self.group
    }

    pub fn orbital_irrep(&self, orb: usize) -> usize {
        self.orbital_irreps[orb]
    }

    pub fn econst(&self) -> f64 {
        self.econst
    }

    /// Elements per Hamiltonian-vector workspace tile
    pub fn workspace_size(&self) -> usize {
        self.workspace_size
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.options.settings
    }

    pub fn observer(&self) -> &dyn FciObserver {
        self.options.observer.as_ref()
    }

    pub fn kernels(&self) -> &dyn DenseKernels {
        self.options.kernels.as_ref()
    }

    /// Length of the vector space of center irrep `center`; center 0 is the FCI vector
    pub fn vec_length(&self, center: usize) -> usize {
        self.sectors[center].len()
    }

    /// Up and down bitstrings of element `counter` of the center-`center` vector
    pub fn bitstrings_of_counter(&self, center: usize, counter: usize) -> (Bitstring, Bitstring) {
        let sector = &self.sectors[center];
        let addr = sector.locate(counter, &self.up);
        let irrep_down = self.group.product(addr.irrep_up, sector.local_target);
        (
            self.up.bitstring(addr.irrep_up, addr.cnt_up),
            self.down.bitstring(irrep_down, addr.cnt_down),
        )
    }

    /// Position of the determinant (up, down) in the FCI vector
    pub fn counter_of(&self, up: Bitstring, down: Bitstring) -> Option<usize> {
        let irrep_up = self.string_irrep(up);
        let irrep_down = self.string_irrep(down);
        if self.group.product(irrep_up, irrep_down) != self.target_irrep {
            return None;
        }
        let cnt_up = self.up.counter(up)?;
        let cnt_down = self.down.counter(down)?;
        Some(self.sectors[0].index(irrep_up, cnt_up, cnt_down, &self.up))
    }

    /// Coefficient of the determinant (up, down), zero outside the space
    pub fn fci_coefficient(&self, up: Bitstring, down: Bitstring, vector: &[f64]) -> f64 {
        self.counter_of(up, down).map_or(0.0, |counter| vector[counter])
    }

    pub fn dot(&self, x: &[f64], y: &[f64]) -> f64 {
        self.kernels().dot(x, y)
    }

    pub fn axpy(&self, alpha: f64, x: &[f64], y: &mut [f64]) {
        self.kernels().axpy(alpha, x, y)
    }

    pub fn scal(&self, alpha: f64, x: &mut [f64]) {
        self.kernels().scal(alpha, x)
    }

    pub fn copy(&self, source: &[f64], dest: &mut [f64]) {
        self.kernels().copy(source, dest)
    }

    #[inline]
    pub(crate) fn string_irrep(&self, string: Bitstring) -> usize {
        string_irrep(self.group, &self.orbital_irreps, string)
    }

    #[inline]
    pub(crate) fn gmat(&self, i: usize, j: usize) -> f64 {
        self.gmat[i + self.num_orbitals * j]
    }

    /// (ij|kl)
    #[inline]
    pub(crate) fn eri(&self, i: usize, j: usize, k: usize, l: usize) -> f64 {
        let n = self.num_orbitals;
        self.eri[i + n * (j + n * (k + n * l))]
    }

    pub(crate) fn finished(&self, routine: &str, start: Instant) {
        self.observer()
            .routine_finished(routine, start.elapsed().as_secs_f64());
    }
}

impl std::fmt::Debug for Fci {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fci")
            .field("num_orbitals", &self.num_orbitals)
            .field("nel_up", &self.nel_up)
            .field("nel_down", &self.nel_down)
            .field("group", &self.group)
            .field("target_irrep", &self.target_irrep)
            .field("vec_length", &self.vec_length(0))
            .field("workspace_size", &self.workspace_size)
            .finish_non_exhaustive()
    }
}
