//! Solver behaviour on hand-built and generated matrices.

mod fixtures;

use std::time::Duration;

use proptest::prelude::*;

use route_planner::error::SolveError;
use route_planner::matrix::CostMatrix;
use route_planner::solver::{
    ConstraintProgrammingSolver, ExactPermutation, GreedyNearestNeighbor, ProximitySort, Solver,
    Strategy as Kind,
};
use route_planner::traits::RouteSolver;

use fixtures::{asymmetric_triangle, triangle};

const ALL: [Kind; 4] = [
    Kind::Greedy,
    Kind::Exact,
    Kind::Cp,
    Kind::Proximity,
];

fn solver(strategy: Kind) -> Solver {
    Solver::new(strategy, 10, Duration::from_secs(5), 1000.0)
}

/// Square matrix of whole-number costs with a start index.
fn matrices(max_size: usize) -> impl Strategy<Value = (CostMatrix, usize)> {
    (1..=max_size).prop_flat_map(|n| {
        (
            prop::collection::vec(0u32..1000, n * n),
            0..n,
        )
            .prop_map(move |(costs, start)| {
                let rows = costs
                    .chunks(n)
                    .map(|row| row.iter().map(|&c| f64::from(c)).collect())
                    .collect();
                (CostMatrix::from_rows(rows).unwrap(), start)
            })
    })
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn triangle_greedy_and_exact_agree() {
    let matrix = CostMatrix::from_rows(triangle()).unwrap();

    for solver in [solver(Kind::Greedy), solver(Kind::Exact)] {
        let route = solver.solve(&matrix, 0).unwrap();
        assert_eq!(route.order(), &[0, 1, 2]);
        assert_eq!(matrix.path_distance(route.order()), 2.0);
    }
}

#[test]
fn asymmetric_triangle_reads_directional_entries() {
    let matrix = CostMatrix::from_rows(asymmetric_triangle()).unwrap();

    // Greedy leaves A along its cheapest outgoing arc (A -> B = 1, not C -> A = 0.1).
    let greedy = GreedyNearestNeighbor.solve(&matrix, 0).unwrap();
    assert_eq!(greedy.order(), &[0, 1, 2]);
    assert_eq!(matrix.path_distance(greedy.order()), 2.0);

    // A -> C -> B costs 1.5 + 0.1; the transpose would claim 0.1 + 0.1.
    let exact = ExactPermutation::default().solve(&matrix, 0).unwrap();
    assert_eq!(exact.order(), &[0, 2, 1]);
    assert_eq!(matrix.path_distance(exact.order()), 1.5 + 0.1);

    let cp = ConstraintProgrammingSolver::default().solve(&matrix, 0).unwrap();
    assert_eq!(cp.order(), exact.order());
}

#[test]
fn start_in_the_middle() {
    let matrix = CostMatrix::from_rows(triangle()).unwrap();

    for strategy in ALL {
        let route = solver(strategy).solve(&matrix, 1).unwrap();
        assert_eq!(route.start(), Some(1), "{strategy:?}");
        assert!(route.is_permutation_of(3), "{strategy:?}");
    }
}

#[test]
fn exact_refuses_instead_of_stalling() {
    let n = 40;
    let matrix = CostMatrix::from_rows(vec![vec![1.0; n]; n]).unwrap();

    assert_eq!(
        ExactPermutation::new(10).solve(&matrix, 0),
        Err(SolveError::ProblemTooLarge { stops: 40, max: 10 })
    );
}

#[test]
fn cp_handles_a_few_hundred_stops_within_budget() {
    let n = 200;
    let rows = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| ((i * 37 + j * 11) % 97) as f64 + (i as f64 - j as f64).abs())
                .collect()
        })
        .collect();
    let matrix = CostMatrix::from_rows(rows).unwrap();
    let cp = ConstraintProgrammingSolver::new(Duration::from_secs(2), 1000.0);

    let outcome = cp.solve_detailed(&matrix, 0).unwrap();
    let greedy = GreedyNearestNeighbor.solve(&matrix, 0).unwrap();

    assert!(outcome.route.is_permutation_of(n));
    assert!(matrix.path_distance(outcome.route.order()) <= matrix.path_distance(greedy.order()));
}

#[test]
fn proximity_orders_by_distance_from_start() {
    let matrix = CostMatrix::from_rows(vec![
        vec![0.0, 3.0, 1.0, 2.0],
        vec![3.0, 0.0, 1.0, 1.0],
        vec![1.0, 1.0, 0.0, 1.0],
        vec![2.0, 1.0, 1.0, 0.0],
    ])
    .unwrap();

    assert_eq!(ProximitySort.solve(&matrix, 0).unwrap().order(), &[0, 2, 3, 1]);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn single_stop_is_trivial_for_every_strategy(strategy in prop::sample::select(ALL.to_vec())) {
        let route = solver(strategy).solve(&CostMatrix::trivial(), 0).unwrap();
        prop_assert_eq!(route.order(), &[0]);
    }

    #[test]
    fn greedy_visits_every_stop_once((matrix, start) in matrices(30)) {
        let route = GreedyNearestNeighbor.solve(&matrix, start).unwrap();
        prop_assert_eq!(route.start(), Some(start));
        prop_assert!(route.is_permutation_of(matrix.size()));
    }

    #[test]
    fn exact_is_never_worse_than_greedy((matrix, start) in matrices(8)) {
        let exact = ExactPermutation::default().solve(&matrix, start).unwrap();
        let greedy = GreedyNearestNeighbor.solve(&matrix, start).unwrap();

        prop_assert!(exact.is_permutation_of(matrix.size()));
        prop_assert!(matrix.path_distance(exact.order()) <= matrix.path_distance(greedy.order()));
    }

    #[test]
    fn cp_is_never_worse_than_greedy((matrix, start) in matrices(12)) {
        let cp = ConstraintProgrammingSolver::default().solve(&matrix, start).unwrap();
        let greedy = GreedyNearestNeighbor.solve(&matrix, start).unwrap();

        prop_assert_eq!(cp.start(), Some(start));
        prop_assert!(cp.is_permutation_of(matrix.size()));
        prop_assert!(matrix.path_distance(cp.order()) <= matrix.path_distance(greedy.order()));
    }

    #[test]
    fn cp_never_beats_exact((matrix, start) in matrices(7)) {
        let cp = ConstraintProgrammingSolver::default().solve(&matrix, start).unwrap();
        let exact = ExactPermutation::default().solve(&matrix, start).unwrap();

        prop_assert!(matrix.path_distance(exact.order()) <= matrix.path_distance(cp.order()));
    }
}
