use crate::{
    ensure_eq,
    simplex::{self, Mode, Outcome, Problem, SolverConfig, Tableau},
};

use super::Error;

/// Parses a problem file and solves it, dualizing minimization problems.
pub fn solve_text(input: &str, config: SolverConfig) -> Result<Outcome, Error> {
    log::info!("Received input:\n{input}");

    let problem = input.parse::<Problem>()?;
    log::info!("Problem formed:\n{problem}");

    let outcome = problem.solve(config)?;
    log::info!("Solution:\n{}", outcome.primary());
    Ok(outcome)
}

/// Solves a hand-built tableau given as rows plus one label per column.
pub fn solve_tableau(
    rows: &[Vec<f64>],
    labels: Vec<String>,
    mode: Mode,
    config: SolverConfig,
) -> Result<Outcome, Error> {
    log::info!(
        "Received tableau with {} rows and labels {}",
        rows.len(),
        labels.join(", ")
    );

    for row in rows {
        ensure_eq!(row.len(), labels.len());
    }
    log::info!("Shape assertions passed");

    let tableau = Tableau::from_rows(rows, labels)?;
    let outcome = simplex::run(tableau, mode, config)?;
    log::info!("Solution:\n{}", outcome.primary());
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::simplex::{ParseErrorKind, SolveError};

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn solves_problem_text() {
        let outcome = solve_text(
            "max\nz = 3x1 + 5x2\nx1 + x2 <= 4\nx1 + 3x2 <= 6",
            SolverConfig::default(),
        )
        .unwrap();

        assert_eq!(outcome.mode, Mode::Primal);
        assert_eq!(outcome.steps.len(), 2);
        assert_abs_diff_eq!(outcome.primary().objective, 14., epsilon = 1e-9);
    }

    #[test]
    fn parse_failures_are_reported() {
        let err = solve_text("max\nz = 3x1", SolverConfig::default()).unwrap_err();

        assert_eq!(
            err,
            Error::Parse(simplex::ParseError::new(3, ParseErrorKind::NoConstraints))
        );
    }

    #[test]
    fn unbounded_problem_fails() {
        let err = solve_text("max\nz = x1 + x2\nx1 - x2 <= 1", SolverConfig::default())
            .unwrap_err();

        assert_eq!(err, Error::Solve(SolveError::Unbounded { column: 1 }));
        assert_eq!(
            err.to_string(),
            "the objective is unbounded: no pivot row for column 1"
        );
    }

    #[test]
    fn iteration_budget_is_enforced() {
        let err = solve_text(
            "max\nz = 3x1 + 5x2\nx1 + x2 <= 4\nx1 + 3x2 <= 6",
            SolverConfig::default().with_max_iterations(1),
        )
        .unwrap_err();

        assert_eq!(err, Error::Solve(SolveError::DidNotConverge { iterations: 1 }));
    }

    #[test]
    fn solves_raw_tableau() {
        let outcome = solve_tableau(
            &[
                vec![1., 2., 1., 0., 0., 5.],
                vec![1., 1., 0., 1., 0., 4.],
                vec![-2., -4., 0., 0., 1., 0.],
            ],
            labels(&["x1", "x2", "s1", "s2", "z", "sol"]),
            Mode::Primal,
            SolverConfig::default(),
        )
        .unwrap();

        assert_eq!(outcome.solutions.len(), 2);
        assert_abs_diff_eq!(outcome.solutions[1].value("x1").unwrap(), 3., epsilon = 1e-9);
        assert_abs_diff_eq!(outcome.solutions[1].value("x2").unwrap(), 1., epsilon = 1e-9);
    }

    #[test]
    fn infeasible_start_is_rejected() {
        let err = solve_text("max\nz = -x1\nx1 >= 2", SolverConfig::default()).unwrap_err();

        assert_eq!(err, Error::Solve(SolveError::InfeasibleStart { row: 0 }));
    }

    #[test]
    fn negative_rhs_in_raw_tableau_is_rejected() {
        let err = solve_tableau(
            &[
                vec![1., 1., 1., 0., 0., 4.],
                vec![-1., -3., 0., 1., 0., -6.],
                vec![-3., -5., 0., 0., 1., 0.],
            ],
            labels(&["x1", "x2", "s1", "s2", "z", "sol"]),
            Mode::Primal,
            SolverConfig::default(),
        )
        .unwrap_err();

        assert_eq!(err, Error::Solve(SolveError::InfeasibleStart { row: 1 }));
    }

    #[test]
    fn huge_variable_index_is_a_parse_error() {
        let err = solve_text(
            "max\nz = x18446744073709551615\nx1 <= 4",
            SolverConfig::default(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            Error::Parse(simplex::ParseError {
                line: 2,
                kind: ParseErrorKind::IndexTooLarge { .. }
            })
        ));
    }

    #[test]
    fn ragged_tableau_is_rejected() {
        let err = solve_tableau(
            &[vec![1., 1., 0., 4.], vec![-1., 0., 1.]],
            labels(&["x1", "s1", "z", "sol"]),
            Mode::Primal,
            SolverConfig::default(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Solve(SolveError::MalformedTableau { .. })));
    }
}
