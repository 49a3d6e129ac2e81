mod config;
mod engine;
mod error;
mod pivot;
mod problem;
mod reduce;
mod solution;
mod tableau;

pub use config::SolverConfig;
pub use engine::{Branch, EngineState, LoggedStep, SimplexEngine, StepOutcome};
pub use error::{ParseError, ParseErrorKind, SolveError, SolveResult};
pub use pivot::{
    most_negative_column, pivot_step, select_pivot, smallest_ratio_row, PivotStep, Selection,
};
pub use problem::*;
pub use reduce::reduce;
pub use solution::{explore_solutions, read_solution, Assignment, Extraction, Mode, Solution};
pub use tableau::{Tableau, OBJECTIVE_LABEL, RHS_LABEL};

use serde::Serialize;

/// Everything a solve produced: the starting tableau, every pivot in order and the optimal
/// solutions, primary one first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub mode: Mode,
    pub initial: Tableau,
    pub steps: Vec<LoggedStep>,
    pub solutions: Vec<Solution>,
}

impl Outcome {
    /// The solution found by the greedy pivoting path.
    pub fn primary(&self) -> &Solution {
        &self.solutions[0]
    }
}

/// Checks that every constraint row has a non-negative right-hand side and a basic column, so
/// the pivoting starts from a feasible vertex.
pub fn check_start(tableau: &Tableau, tolerance: f64) -> SolveResult<()> {
    for row in tableau.constraint_rows() {
        if tableau.rhs(row) < -tolerance || tableau.basic_column(row, tolerance).is_none() {
            return Err(SolveError::InfeasibleStart { row });
        }
    }
    Ok(())
}

/// Solves a ready tableau and enumerates the alternate optima of its terminal tableau.
pub fn run(tableau: Tableau, mode: Mode, config: SolverConfig) -> SolveResult<Outcome> {
    check_start(&tableau, config.tolerance)?;
    let initial = tableau.clone();
    let mut engine = SimplexEngine::new(tableau, config);
    engine.solve()?;

    let (terminal, mut steps) = engine.into_parts();
    let used_columns = steps
        .iter()
        .map(|logged| logged.step.pivot_column)
        .collect::<Vec<_>>();
    let solutions = explore_solutions(terminal, mode, config, used_columns, &mut steps);

    Ok(Outcome {
        mode,
        initial,
        steps,
        solutions,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use proptest::{collection::vec, prop_assert, proptest, strategy::Strategy};

    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn textbook_round_trip() {
        let tableau = Tableau::from_rows(
            &[
                vec![1., 1., 1., 0., 0., 4.],
                vec![1., 3., 0., 1., 0., 6.],
                vec![-3., -5., 0., 0., 1., 0.],
            ],
            labels(&["x1", "x2", "s1", "s2", "z", "sol"]),
        )
        .unwrap();

        let outcome = run(tableau.clone(), Mode::Primal, SolverConfig::default()).unwrap();

        assert_eq!(outcome.initial, tableau);
        assert_eq!(outcome.steps.len(), 2);
        assert_eq!(outcome.steps[0].step.pivot_column, 1);
        assert_eq!(outcome.steps[0].step.pivot_row, 1);
        assert_eq!(outcome.solutions.len(), 1);
        let primary = outcome.primary();
        assert_abs_diff_eq!(primary.objective, 14., epsilon = 1e-9);
        assert_abs_diff_eq!(primary.value("x1").unwrap(), 3., epsilon = 1e-9);
        assert_abs_diff_eq!(primary.value("x2").unwrap(), 1., epsilon = 1e-9);
    }

    #[test]
    fn degenerate_optimum_yields_every_vertex_with_equal_objective() {
        let tableau = Tableau::from_rows(
            &[
                vec![1., 2., 1., 0., 0., 5.],
                vec![1., 1., 0., 1., 0., 4.],
                vec![-2., -4., 0., 0., 1., 0.],
            ],
            labels(&["x1", "x2", "s1", "s2", "z", "sol"]),
        )
        .unwrap();

        let outcome = run(tableau, Mode::Primal, SolverConfig::default()).unwrap();

        assert!(outcome.solutions.len() >= 2);
        assert!(outcome
            .solutions
            .iter()
            .all(|solution| (solution.objective - 10.).abs() < 1e-9));
        assert_eq!(outcome.steps.len(), 2);
        assert!(outcome.steps[0].branch.is_primary());
        assert!(outcome.steps[1].branch.is_alternate());
    }

    /// `max c·x` subject to `A x <= b` with strictly positive data, which keeps it bounded and
    /// the slack basis feasible.
    fn positive_problem() -> impl Strategy<Value = (Vec<Vec<f64>>, Vec<f64>, Vec<f64>)> {
        (2usize..5, 1usize..5).prop_flat_map(|(m, n)| {
            (
                vec(vec(1.0..10.0f64, n), m),
                vec(1.0..20.0f64, m),
                vec(1.0..10.0f64, n),
            )
        })
    }

    fn slack_tableau(a: &[Vec<f64>], b: &[f64], c: &[f64]) -> Tableau {
        let (m, n) = (b.len(), c.len());
        let mut rows = a
            .iter()
            .zip(b)
            .enumerate()
            .map(|(i, (coefficients, rhs))| {
                let mut row = coefficients.clone();
                row.extend((0..m).map(|j| if i == j { 1. } else { 0. }));
                row.extend([0., *rhs]);
                row
            })
            .collect::<Vec<_>>();
        let mut objective = c.iter().map(|c| -c).collect::<Vec<_>>();
        objective.extend(std::iter::repeat(0.).take(m));
        objective.extend([1., 0.]);
        rows.push(objective);

        let labels = (1..=n)
            .map(|j| format!("x{j}"))
            .chain((1..=m).map(|i| format!("s{i}")))
            .chain(["z".to_owned(), "sol".to_owned()])
            .collect();
        Tableau::from_rows(&rows, labels).unwrap()
    }

    proptest! {
        #[test]
        fn primary_solution_is_consistent_and_feasible((a, b, c) in positive_problem()) {
            let outcome = run(slack_tableau(&a, &b, &c), Mode::Primal, SolverConfig::default())
                .unwrap();
            let primary = outcome.primary();
            let x = (1..=c.len())
                .map(|j| primary.value(&format!("x{j}")).unwrap())
                .collect::<Vec<_>>();

            let objective = c.iter().zip(&x).map(|(c, x)| c * x).sum::<f64>();
            prop_assert!((objective - primary.objective).abs() < 1e-6);
            for (row, rhs) in a.iter().zip(&b) {
                let lhs = row.iter().zip(&x).map(|(a, x)| a * x).sum::<f64>();
                prop_assert!(lhs <= rhs + 1e-6);
            }
            prop_assert!(x.iter().all(|x| *x >= -1e-9));
            prop_assert!(outcome
                .solutions
                .iter()
                .all(|s| (s.objective - primary.objective).abs() < 1e-6));
        }
    }
}
