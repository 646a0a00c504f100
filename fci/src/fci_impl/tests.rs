//! Tests for the FCI core

#[cfg(test)]
mod tests {
    extern crate nalgebra as na;

    use super::super::{Fci, FciOptions, LadderOperator, RdmSelection, Spin};
    use crate::linalg::{fill_random, frobenius_norm};
    use crate::observer::SilentObserver;
    use hamiltonian::{Hamiltonian, Integrals, PointGroup};
    use na::{DMatrix, DVector};
    use num_complex::Complex64;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::Arc;

    fn silent() -> FciOptions {
        FciOptions {
            observer: Arc::new(SilentObserver),
            ..FciOptions::default()
        }
    }

    fn build<H: Integrals>(ham: &H, nel_up: usize, nel_down: usize, target: usize) -> Fci {
        Fci::with_options(ham, nel_up, nel_down, target, 100.0, silent()).unwrap()
    }

    /// Random symmetry-allowed integrals over orbitals of the given irreps
    fn random_hamiltonian(group: PointGroup, irreps: Vec<usize>, seed: u64) -> Hamiltonian {
        let l = irreps.len();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut ham = Hamiltonian::new(group, irreps).unwrap();
        ham.set_econst(rng.gen_range(-1.0..1.0));
        for i in 0..l {
            for j in i..l {
                if ham.tmat_allowed(i, j) {
                    let diagonal = if i == j { -(i as f64) } else { 0.0 };
                    ham.set_tmat(i, j, diagonal + rng.gen_range(-0.5..0.5));
                }
            }
        }
        for i in 0..l {
            for j in 0..l {
                for k in 0..l {
                    for m in 0..l {
                        if ham.vmat_allowed(i, j, k, m) {
                            ham.set_vmat(i, j, k, m, rng.gen_range(-0.3..0.3));
                        }
                    }
                }
            }
        }
        ham
    }

    /// Four orbitals in C2 with irreps A, B, A, B
    fn random_c2_hamiltonian(seed: u64) -> Hamiltonian {
        random_hamiltonian(PointGroup::C2, vec![0, 1, 0, 1], seed)
    }

    /// Five orbitals in D2h spread over four irreps, so every center irrep
    /// of the product carries pairs
    fn random_d2h_hamiltonian(seed: u64) -> Hamiltonian {
        random_hamiltonian(PointGroup::D2h, vec![0, 3, 5, 6, 0], seed)
    }

    /// Gamma_ijkl = Gamma_jilk = Gamma_klij = Gamma_lkji
    fn assert_two_rdm_symmetric(two_rdm: &[f64], l: usize) {
        let idx = |i: usize, j: usize, k: usize, m: usize| i + l * (j + l * (k + l * m));
        for i in 0..l {
            for j in 0..l {
                for k in 0..l {
                    for m in 0..l {
                        let value = two_rdm[idx(i, j, k, m)];
                        for image in [idx(j, i, m, k), idx(k, m, i, j), idx(m, k, j, i)] {
                            assert!(
                                (value - two_rdm[image]).abs() < 1e-10,
                                "Gamma2[{}, {}, {}, {}] = {} differs from its image {}",
                                i,
                                j,
                                k,
                                m,
                                value,
                                two_rdm[image]
                            );
                        }
                    }
                }
            }
        }
    }

    /// Gamma_{ijk,lmn} is invariant under a common permutation of (ijk) and
    /// (lmn) and under the exchange of both triples
    fn assert_three_rdm_symmetric(three_rdm: &[f64], l: usize) {
        const PERMUTATIONS: [[usize; 3]; 6] = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        let idx = |a: [usize; 3], b: [usize; 3]| a[0] + l * (a[1] + l * (a[2] + l * (b[0] + l * (b[1] + l * b[2]))));
        for flat in 0..l.pow(6) {
            let digit = |position: u32| (flat / l.pow(position)) % l;
            let upper = [digit(0), digit(1), digit(2)];
            let lower = [digit(3), digit(4), digit(5)];
            let value = three_rdm[flat];
            for perm in PERMUTATIONS {
                let a = [upper[perm[0]], upper[perm[1]], upper[perm[2]]];
                let b = [lower[perm[0]], lower[perm[1]], lower[perm[2]]];
                for image in [idx(a, b), idx(b, a)] {
                    assert!(
                        (value - three_rdm[image]).abs() < 1e-10,
                        "Gamma3{:?}{:?} = {} differs from its image {}",
                        upper,
                        lower,
                        value,
                        three_rdm[image]
                    );
                }
            }
        }
    }

    /// sum_k Gamma3_ijk,lmk = (N - 2) Gamma2_ij,lm
    fn assert_three_rdm_partial_trace(three_rdm: &[f64], two_rdm: &[f64], l: usize, num_electrons: f64) {
        let idx2 = |i: usize, j: usize, k: usize, m: usize| i + l * (j + l * (k + l * m));
        let idx3 = |i: usize, j: usize, k: usize, p: usize, q: usize, r: usize| {
            i + l * (j + l * (k + l * (p + l * (q + l * r))))
        };
        for i in 0..l {
            for j in 0..l {
                for p in 0..l {
                    for q in 0..l {
                        let contracted: f64 = (0..l).map(|k| three_rdm[idx3(i, j, k, p, q, k)]).sum();
                        let expected = (num_electrons - 2.0) * two_rdm[idx2(i, j, p, q)];
                        assert!((contracted - expected).abs() < 1e-8);
                    }
                }
            }
        }
    }

    /// Dense H of the FCI vector space, constant energy included
    fn dense_hamiltonian(fci: &Fci) -> DMatrix<f64> {
        let n = fci.vec_length(0);
        let mut matrix = DMatrix::zeros(n, n);
        let mut unit = vec![0.0; n];
        let mut image = vec![0.0; n];
        for col in 0..n {
            unit.fill(0.0);
            unit[col] = 1.0;
            fci.alpha_plus_beta_ham(0.0, 1.0, &unit, &mut image);
            for row in 0..n {
                matrix[(row, col)] = image[row];
            }
        }
        matrix
    }

    fn lowest_eigenvalue(matrix: &DMatrix<f64>) -> f64 {
        matrix
            .clone()
            .symmetric_eigen()
            .eigenvalues
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min)
    }

    fn random_unit_vector(n: usize, seed: u64) -> Vec<f64> {
        let mut vector = vec![0.0; n];
        fill_random(&mut vector, &mut StdRng::seed_from_u64(seed));
        let norm = frobenius_norm(&vector);
        vector.iter_mut().for_each(|x| *x /= norm);
        vector
    }

    /// <bra| (alpha + beta H + i eta)^-1 |ket> by a dense complex solve
    fn dense_resolvent(fci: &Fci, alpha: f64, beta: f64, eta: f64, bra: &[f64], ket: &[f64]) -> Complex64 {
        let n = fci.vec_length(0);
        let ham = dense_hamiltonian(fci);
        let shifted = DMatrix::from_fn(n, n, |i, j| {
            let diagonal = if i == j { Complex64::new(alpha, eta) } else { Complex64::new(0.0, 0.0) };
            diagonal + Complex64::new(beta * ham[(i, j)], 0.0)
        });
        let rhs = DVector::from_iterator(n, ket.iter().map(|&x| Complex64::new(x, 0.0)));
        let solution = shifted.lu().solve(&rhs).unwrap();
        bra.iter()
            .zip(solution.iter())
            .map(|(&b, &x)| x * b)
            .sum()
    }

    #[test]
    fn test_hubbard_dimer_energy() {
        let (t, u) = (1.0, 4.0);
        let ham = Hamiltonian::hubbard_chain(2, t, u, false);
        let fci = build(&ham, 1, 1, 0);
        assert_eq!(fci.vec_length(0), 4);

        let mut gs = vec![0.0; 4];
        let energy = fci.ground_state(Some(&mut gs)).unwrap();
        let exact = 0.5 * (u - (u * u + 16.0 * t * t).sqrt());
        assert!((energy - exact).abs() < 1e-10);
        assert!((frobenius_norm(&gs) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_ground_state_matches_dense_diagonalization() {
        let ham = random_c2_hamiltonian(3);
        let fci = build(&ham, 2, 1, 1);
        let exact = lowest_eigenvalue(&dense_hamiltonian(&fci));
        let energy = fci.ground_state(None).unwrap();
        assert!((energy - exact).abs() < 1e-9);
    }

    #[test]
    fn test_counter_bitstring_bijection() {
        let ham = random_c2_hamiltonian(1);
        let fci = build(&ham, 2, 2, 0);
        for counter in 0..fci.vec_length(0) {
            let (up, down) = fci.bitstrings_of_counter(0, counter);
            assert_eq!(up.count_ones(), 2);
            assert_eq!(down.count_ones(), 2);
            assert_eq!(fci.counter_of(up, down), Some(counter));
        }
        // 0b0011 lives in irrep B and 0b0101 in irrep A, so the pair is outside the A sector
        let vector = vec![1.0; fci.vec_length(0)];
        assert_eq!(fci.counter_of(0b0011, 0b0101), None);
        assert_eq!(fci.fci_coefficient(0b0011, 0b0101, &vector), 0.0);
        assert_eq!(fci.fci_coefficient(0b0101, 0b0101, &vector), 1.0);
    }

    #[test]
    fn test_hamiltonian_is_symmetric_and_matches_slater_condon() {
        let ham = random_c2_hamiltonian(5);
        let fci = build(&ham, 2, 1, 0);
        let dense = dense_hamiltonian(&fci);
        let n = fci.vec_length(0);
        for row in 0..n {
            let (bra_up, bra_down) = fci.bitstrings_of_counter(0, row);
            for col in 0..n {
                let (ket_up, ket_down) = fci.bitstrings_of_counter(0, col);
                assert!((dense[(row, col)] - dense[(col, row)]).abs() < 1e-12);
                let constant = if row == col { fci.econst() } else { 0.0 };
                let element = fci.matrix_element(bra_up, bra_down, ket_up, ket_down) + constant;
                assert!(
                    (dense[(row, col)] - element).abs() < 1e-12,
                    "H[{}, {}] = {} but Slater-Condon gives {}",
                    row,
                    col,
                    dense[(row, col)],
                    element
                );
            }
        }
    }

    #[test]
    fn test_diagonals_of_h_and_h_squared() {
        let ham = random_c2_hamiltonian(7);
        let fci = build(&ham, 2, 2, 1);
        let n = fci.vec_length(0);
        let mut dense = dense_hamiltonian(&fci);
        for i in 0..n {
            dense[(i, i)] -= fci.econst();
        }
        let squared = &dense * &dense;

        let mut diag = vec![0.0; n];
        let mut diag_squared = vec![0.0; n];
        fci.diag_ham(&mut diag);
        fci.diag_ham_squared(&mut diag_squared);
        for i in 0..n {
            assert!((diag[i] - dense[(i, i)]).abs() < 1e-12);
            assert!((diag_squared[i] - squared[(i, i)]).abs() < 1e-10);
        }

        let lowest = fci.lowest_energy_determinant();
        assert!(diag.iter().all(|&value| value >= diag[lowest]));
    }

    #[test]
    fn test_small_workspace_gives_same_product() {
        let ham = random_c2_hamiltonian(11);
        let large = build(&ham, 2, 2, 0);
        let small = Fci::with_options(&ham, 2, 2, 0, 1e-9, silent()).unwrap();
        assert!(small.workspace_size() < large.workspace_size());

        let input = random_unit_vector(large.vec_length(0), 2);
        let mut expected = vec![0.0; input.len()];
        let mut tiled = vec![0.0; input.len()];
        large.ham_times_vec(&input, &mut expected);
        small.ham_times_vec(&input, &mut tiled);
        for (a, b) in expected.iter().zip(&tiled) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_tiled_product_with_several_center_irreps() {
        let ham = random_d2h_hamiltonian(29);
        for (nel_up, nel_down, target) in [(2, 2, 0), (3, 2, 5)] {
            let large = build(&ham, nel_up, nel_down, target);
            let small = Fci::with_options(&ham, nel_up, nel_down, target, 1e-9, silent()).unwrap();
            assert!(small.workspace_size() < large.workspace_size());

            let n = small.vec_length(0);
            assert!(n > 0);
            let dense = dense_hamiltonian(&small);
            for row in 0..n {
                let (bra_up, bra_down) = small.bitstrings_of_counter(0, row);
                for col in 0..n {
                    let (ket_up, ket_down) = small.bitstrings_of_counter(0, col);
                    let constant = if row == col { small.econst() } else { 0.0 };
                    let element = small.matrix_element(bra_up, bra_down, ket_up, ket_down) + constant;
                    assert!((dense[(row, col)] - element).abs() < 1e-12);
                }
            }

            let input = random_unit_vector(n, 6);
            let mut expected = vec![0.0; n];
            let mut tiled = vec![0.0; n];
            large.ham_times_vec(&input, &mut expected);
            small.ham_times_vec(&input, &mut tiled);
            for (a, b) in expected.iter().zip(&tiled) {
                assert!((a - b).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_two_rdm_energy_and_trace() {
        let ham = random_c2_hamiltonian(13);
        let fci = build(&ham, 2, 2, 0);
        let mut gs = vec![0.0; fci.vec_length(0)];
        let energy = fci.ground_state(Some(&mut gs)).unwrap();

        let l = 4;
        let idx = |i: usize, j: usize, k: usize, m: usize| i + l * (j + l * (k + l * m));
        let mut two_rdm = vec![0.0; l.pow(4)];
        let rdm_energy = fci.fill_2rdm(&gs, &mut two_rdm);
        assert!((rdm_energy - energy).abs() < 1e-8);

        let trace: f64 = (0..l)
            .flat_map(|i| (0..l).map(move |j| (i, j)))
            .map(|(i, j)| two_rdm[idx(i, j, i, j)])
            .sum();
        assert!((trace - 12.0).abs() < 1e-8);
        assert_two_rdm_symmetric(&two_rdm, l);
    }

    #[test]
    fn test_three_rdm_partial_trace() {
        let ham = random_c2_hamiltonian(17);
        let fci = build(&ham, 2, 2, 0);
        let mut gs = vec![0.0; fci.vec_length(0)];
        fci.ground_state(Some(&mut gs)).unwrap();

        let l: usize = 4;
        let mut two_rdm = vec![0.0; l.pow(4)];
        let mut three_rdm = vec![0.0; l.pow(6)];
        fci.fill_2rdm(&gs, &mut two_rdm);
        fci.fill_3rdm(&gs, &mut three_rdm);

        assert_three_rdm_partial_trace(&three_rdm, &two_rdm, l, 4.0);
        assert_three_rdm_symmetric(&three_rdm, l);
    }

    #[test]
    fn test_rdms_with_several_center_irreps() {
        let ham = random_d2h_hamiltonian(23);
        let fci = build(&ham, 2, 2, 0);
        let mut gs = vec![0.0; fci.vec_length(0)];
        let energy = fci.ground_state(Some(&mut gs)).unwrap();

        let l: usize = 5;
        let mut two_rdm = vec![0.0; l.pow(4)];
        let mut three_rdm = vec![0.0; l.pow(6)];
        let rdm_energy = fci.fill_2rdm(&gs, &mut two_rdm);
        fci.fill_3rdm(&gs, &mut three_rdm);
        assert!((rdm_energy - energy).abs() < 1e-8);

        let trace: f64 = (0..l * l).map(|ij| two_rdm[ij + l * l * ij]).sum();
        assert!((trace - 12.0).abs() < 1e-8);
        assert_two_rdm_symmetric(&two_rdm, l);
        assert_three_rdm_partial_trace(&three_rdm, &two_rdm, l, 4.0);
        assert_three_rdm_symmetric(&three_rdm, l);
    }

    #[test]
    fn test_spin_squared() {
        let ham = Hamiltonian::hubbard_chain(4, 1.0, 4.0, false);
        let fci = build(&ham, 2, 2, 0);
        let mut gs = vec![0.0; fci.vec_length(0)];
        fci.ground_state(Some(&mut gs)).unwrap();
        assert!(fci.spin_squared(&gs).abs() < 1e-8);

        // two up electrons on two sites: S = 1
        let dimer = Hamiltonian::hubbard_chain(2, 1.0, 4.0, false);
        let triplet = build(&dimer, 2, 0, 0);
        assert_eq!(triplet.vec_length(0), 1);
        assert!((triplet.spin_squared(&[1.0]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_spin_squared_does_not_depend_on_thread_count() {
        let ham = Hamiltonian::hubbard_chain(8, 1.0, 4.0, false);
        let fci = build(&ham, 4, 4, 0);
        let vector = random_unit_vector(fci.vec_length(0), 8);
        assert!(vector.len() > 4 * 1024);

        let reference = fci.spin_squared(&vector);
        for threads in [1, 2, 3, 7] {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build().unwrap();
            let value = pool.install(|| fci.spin_squared(&vector));
            assert_eq!(value.to_bits(), reference.to_bits(), "{} threads", threads);
        }
    }

    #[test]
    fn test_cg_solve_system() {
        let ham = random_c2_hamiltonian(19);
        let fci = build(&ham, 2, 1, 0);
        let n = fci.vec_length(0);
        let rhs = random_unit_vector(n, 4);
        let mut real = vec![0.0; n];
        let mut imag = vec![0.0; n];
        let (alpha, beta, eta) = (0.3, -1.0, 0.5);
        fci.cg_solve_system(alpha, beta, eta, &rhs, &mut real, &mut imag, true)
            .unwrap();
        assert!(fci.cg_residual_norm(alpha, beta, eta, &rhs, &real, &imag) < 1e-4);

        let projected = Complex64::new(fci.dot(&rhs, &real), fci.dot(&rhs, &imag));
        let expected = dense_resolvent(&fci, alpha, beta, eta, &rhs, &rhs);
        assert!((projected - expected).norm() < 1e-5);
    }

    #[test]
    fn test_number_operator_counts_electrons() {
        let ham = random_c2_hamiltonian(23);
        let fci = build(&ham, 2, 1, 1);
        let psi = random_unit_vector(fci.vec_length(0), 5);
        let mut image = vec![0.0; psi.len()];
        let total: f64 = (0..4)
            .map(|orb| {
                fci.act_with_number_operator(orb, &mut image, &psi);
                fci.dot(&psi, &image)
            })
            .sum();
        assert!((total - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_ladder_operators_anticommute() {
        let ham = Hamiltonian::hubbard_chain(4, 1.0, 2.0, false);
        let base = build(&ham, 2, 2, 0);
        let psi = random_unit_vector(base.vec_length(0), 6);
        let sibling = |up, down| base.sibling(&ham, up, down, 0).unwrap();
        let act = |target: &Fci, op, spin, orb, source: &Fci, vector: &[f64]| {
            let mut result = vec![0.0; target.vec_length(0)];
            target.act_with_second_quantized_operator(op, spin, orb, &mut result, source, vector);
            result
        };
        use LadderOperator::{Annihilator, Creator};

        // {a_p,up , a+_q,down} = 0
        let s23 = sibling(2, 3);
        let s12 = sibling(1, 2);
        let s13 = sibling(1, 3);
        let mut nonzero = false;
        for p in 0..4 {
            for q in 0..4 {
                let first = act(&s13, Annihilator, Spin::Up, p, &s23, &act(&s23, Creator, Spin::Down, q, &base, &psi));
                let second = act(&s13, Creator, Spin::Down, q, &s12, &act(&s12, Annihilator, Spin::Up, p, &base, &psi));
                nonzero |= frobenius_norm(&first) > 1e-3;
                for (a, b) in first.iter().zip(&second) {
                    assert!((a + b).abs() < 1e-12);
                }
            }
        }
        assert!(nonzero);

        // {a_p,down , a+_p,down} = 1
        let s21 = sibling(2, 1);
        for p in 0..4 {
            let first = act(&base, Annihilator, Spin::Down, p, &s23, &act(&s23, Creator, Spin::Down, p, &base, &psi));
            let second = act(&base, Creator, Spin::Down, p, &s21, &act(&s21, Annihilator, Spin::Down, p, &base, &psi));
            for ((a, b), x) in first.iter().zip(&second).zip(&psi) {
                assert!((a + b - x).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_addition_and_removal_match_dense_resolvent() {
        let ham = random_c2_hamiltonian(29);
        let fci = build(&ham, 2, 1, 0);
        let psi = random_unit_vector(fci.vec_length(0), 7);
        let (omega, eta, e0) = (0.2, 0.5, -1.5);

        // orbitals 0 and 2 share irrep A
        let addition = fci
            .retarded_gf_addition(omega, eta, 0, 2, Spin::Up, e0, &psi, &ham, RdmSelection::none())
            .unwrap();
        let plus = fci.sibling(&ham, 3, 1, 0).unwrap();
        let dressed = |orb| {
            let mut v = vec![0.0; plus.vec_length(0)];
            plus.act_with_second_quantized_operator(LadderOperator::Creator, Spin::Up, orb, &mut v, &fci, &psi);
            v
        };
        let expected = dense_resolvent(&plus, omega + e0, -1.0, eta, &dressed(0), &dressed(2));
        assert!((addition.value - expected).norm() < 1e-5);

        let removal = fci
            .retarded_gf_removal(omega, eta, 0, 2, Spin::Down, e0, &psi, &ham, RdmSelection::none())
            .unwrap();
        let minus = fci.sibling(&ham, 2, 0, 0).unwrap();
        let removed = |orb| {
            let mut v = vec![0.0; minus.vec_length(0)];
            minus.act_with_second_quantized_operator(LadderOperator::Annihilator, Spin::Down, orb, &mut v, &fci, &psi);
            v
        };
        let expected = dense_resolvent(&minus, omega - e0, 1.0, eta, &removed(2), &removed(0));
        assert!((removal.value - expected).norm() < 1e-5);
    }

    #[test]
    fn test_gf_matrix_respects_symmetry() {
        let ham = random_c2_hamiltonian(31);
        let fci = build(&ham, 2, 2, 0);
        let psi = random_unit_vector(fci.vec_length(0), 8);
        let orbs = [0, 1, 2, 3];
        let matrix = fci
            .gf_matrix_removal(-0.5, 1.0, 0.1, &orbs, &orbs, Spin::Up, &psi, &ham, RdmSelection::none())
            .unwrap();
        assert_eq!(matrix.values.shape(), (4, 4));
        assert_eq!(matrix.rdms.len(), 4);
        for row in 0..4 {
            for col in 0..4 {
                let value = matrix.values[(row, col)];
                if ham.orbital_irrep(row) != ham.orbital_irrep(col) {
                    assert_eq!(value, Complex64::new(0.0, 0.0));
                }
            }
            assert!(matrix.values[(row, row)].norm() > 0.0);
        }
    }

    #[test]
    fn test_retarded_gf_high_frequency_tail() {
        let ham = Hamiltonian::hubbard_chain(4, 1.0, 4.0, false);
        let fci = build(&ham, 2, 2, 0);
        let mut gs = vec![0.0; fci.vec_length(0)];
        let e0 = fci.ground_state(Some(&mut gs)).unwrap();

        // G_ii(w) -> 1 / w and G_ij(w) -> 0 for i != j
        let omega = 1.0e4;
        let diagonal = fci.retarded_gf(omega, 0.01, 1, 1, Spin::Up, e0, &gs, &ham).unwrap();
        assert!((omega * diagonal.re - 1.0).abs() < 0.01);
        let off_diagonal = fci.retarded_gf(omega, 0.01, 0, 2, Spin::Up, e0, &gs, &ham).unwrap();
        assert!(omega * off_diagonal.norm() < 0.01);
    }

    #[test]
    fn test_resolvent_rdms() {
        let ham = Hamiltonian::hubbard_chain(3, 1.0, 2.0, false);
        let fci = build(&ham, 1, 1, 0);
        let mut gs = vec![0.0; fci.vec_length(0)];
        let e0 = fci.ground_state(Some(&mut gs)).unwrap();

        let element = fci
            .retarded_gf_addition(0.5, 0.1, 0, 0, Spin::Up, e0, &gs, &ham, RdmSelection::all())
            .unwrap();
        let dressed = element.rdms.dressed.unwrap();
        assert_eq!(dressed.len(), 81);
        assert!(element.rdms.real.is_some() && element.rdms.imag.is_some());

        // the removal sector has a single electron
        let result = fci.retarded_gf_removal(0.5, 0.1, 0, 0, Spin::Up, e0, &gs, &ham, RdmSelection::all());
        assert!(result.is_err());
    }

    #[test]
    fn test_density_response() {
        let ham = random_c2_hamiltonian(37);
        let fci = build(&ham, 2, 1, 0);
        let psi = random_unit_vector(fci.vec_length(0), 9);
        let (omega, eta, e0) = (0.4, 0.5, -2.0);

        let fluctuation = |orb| {
            let mut v = vec![0.0; psi.len()];
            fci.act_with_number_operator(orb, &mut v, &psi);
            let mean = fci.dot(&v, &psi);
            fci.axpy(-mean, &psi, &mut v);
            v
        };
        let forward = fci
            .density_response_gf_forward(omega, eta, 1, 3, e0, &psi, RdmSelection::none())
            .unwrap();
        let expected = dense_resolvent(&fci, omega + e0, -1.0, eta, &fluctuation(1), &fluctuation(3));
        assert!((forward.value - expected).norm() < 1e-5);

        let backward = fci
            .density_response_gf_backward(omega, eta, 1, 3, e0, &psi, RdmSelection::none())
            .unwrap();
        let expected = dense_resolvent(&fci, omega - e0, 1.0, eta, &fluctuation(3), &fluctuation(1));
        assert!((backward.value - expected).norm() < 1e-5);

        let x13 = fci.density_response_gf(omega, eta, 1, 3, e0, &psi).unwrap();
        let x31 = fci.density_response_gf(omega, eta, 3, 1, e0, &psi).unwrap();
        assert!((x13 - (forward.value - backward.value)).norm() < 1e-10);
        assert!((x13 - x31).norm() < 1e-5);
    }

    #[test]
    fn test_diagonal_excitation_counts_occupation() {
        let ham = random_c2_hamiltonian(43);
        let fci = build(&ham, 2, 1, 0);
        let n = fci.vec_length(0);
        let psi = random_unit_vector(n, 10);
        let mut once = vec![0.0; n];
        let mut twice = vec![0.0; n];
        let mut number = vec![0.0; n];
        let mut number_squared = vec![0.0; n];
        for orb in 0..4 {
            fci.apply_excitation(&psi, &mut once, orb, orb, fci.target_irrep());
            fci.apply_excitation(&once, &mut twice, orb, orb, fci.target_irrep());
            fci.act_with_number_operator(orb, &mut number, &psi);
            fci.act_with_number_operator(orb, &mut number_squared, &number);
            for i in 0..n {
                assert!((once[i] - number[i]).abs() < 1e-12);
                assert!((twice[i] - number_squared[i]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_invalid_construction() {
        let ham = random_c2_hamiltonian(41);
        assert!(Fci::with_options(&ham, 5, 0, 0, 100.0, silent()).is_err());
        assert!(Fci::with_options(&ham, 1, 1, 2, 100.0, silent()).is_err());
        assert!(Fci::with_options(&ham, 1, 1, 0, 0.0, silent()).is_err());

        // the empty determinant only lives in irrep A
        let empty = build(&ham, 0, 0, 1);
        assert_eq!(empty.vec_length(0), 0);
        assert!(empty.ground_state(None).is_err());
    }
}
