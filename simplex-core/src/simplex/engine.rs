use derive_more::IsVariant;
use derive_new::new;
use serde::Serialize;

use super::{
    pivot::{pivot_step, select_pivot, PivotStep, Selection},
    reduce::reduce,
    SolveError, SolveResult, SolverConfig, Tableau,
};

/// Search branch a logged step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, IsVariant)]
pub enum Branch {
    Primary,
    /// `index`-th alternate-optimum pivot, entering `column`.
    Alternate { index: usize, column: usize },
}

/// A pivot together with the tableau it produced.
#[derive(Debug, Clone, PartialEq, Serialize, new)]
pub struct LoggedStep {
    pub branch: Branch,
    pub step: PivotStep,
    pub tableau: Tableau,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum EngineState {
    Running,
    Optimal,
}

#[derive(Debug, Clone, Copy, PartialEq, IsVariant)]
pub enum StepOutcome {
    Pivoted(PivotStep),
    Solved,
}

/// Owns a tableau and pivots it until the objective row has no negative entries.
#[derive(Debug, Clone)]
pub struct SimplexEngine {
    tableau: Tableau,
    config: SolverConfig,
    branch: Branch,
    state: EngineState,
    steps: Vec<LoggedStep>,
}

impl SimplexEngine {
    pub fn new(tableau: Tableau, config: SolverConfig) -> Self {
        Self::on_branch(tableau, config, Branch::Primary)
    }

    pub fn on_branch(tableau: Tableau, config: SolverConfig, branch: Branch) -> Self {
        Self {
            tableau,
            config,
            branch,
            state: EngineState::Running,
            steps: Vec::new(),
        }
    }

    pub fn tableau(&self) -> &Tableau {
        &self.tableau
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn steps(&self) -> &[LoggedStep] {
        &self.steps
    }

    pub fn into_parts(self) -> (Tableau, Vec<LoggedStep>) {
        (self.tableau, self.steps)
    }

    /// Performs one simplex iteration.
    ///
    /// An optimal tableau is left untouched. Fails when the entering column has no pivot row, or
    /// when the iteration budget is already spent and another pivot would be needed.
    pub fn step(&mut self) -> SolveResult<StepOutcome> {
        if self.state.is_optimal() {
            return Ok(StepOutcome::Solved);
        }
        log::debug!("Tableau:\n{}", self.tableau);

        match select_pivot(&self.tableau, None)? {
            Selection::Optimal => {
                log::info!(
                    "Optimal solution was found after {} pivots",
                    self.steps.len()
                );
                self.state = EngineState::Optimal;
                Ok(StepOutcome::Solved)
            }
            Selection::Pivot(step) => {
                if self.steps.len() >= self.config.max_iterations {
                    return Err(SolveError::DidNotConverge {
                        iterations: self.steps.len(),
                    });
                }
                log::info!("Optimal solution was not found");
                self.apply(step);
                Ok(StepOutcome::Pivoted(step))
            }
        }
    }

    /// Runs [`step`](Self::step) until the tableau is optimal and returns the step log.
    pub fn solve(&mut self) -> SolveResult<&[LoggedStep]> {
        let mut iteration = 1u32;
        loop {
            log::info!("Iteration: {iteration}");
            if self.step()?.is_solved() {
                break;
            }
            iteration += 1;
        }
        crate::dbg_display!(self.tableau.objective_value());

        Ok(&self.steps)
    }

    /// Pivots `column` into the basis regardless of its reduced cost.
    pub fn pivot_on(&mut self, column: usize) -> SolveResult<PivotStep> {
        let step = pivot_step(&self.tableau, column, self.tableau.objective(column))?;
        self.apply(step);
        Ok(step)
    }

    fn apply(&mut self, step: PivotStep) {
        log::info!(
            "Pivot column: {} ({}), pivot row: {}",
            step.pivot_column,
            self.tableau.label(step.pivot_column),
            step.pivot_row
        );
        reduce(&mut self.tableau, step.pivot_row, step.pivot_column);
        self.tableau.snap_to_zero(self.config.tolerance);
        self.steps.push(LoggedStep::new(self.branch, step, self.tableau.clone()));
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use proptest::{collection::vec, prop_assert, prop_assert_eq, proptest};

    use super::*;

    fn tableau(rows: &[Vec<f64>]) -> Tableau {
        let ncols = rows[0].len();
        let labels = (1..ncols - 1)
            .map(|i| format!("x{i}"))
            .chain(["z".to_owned(), "sol".to_owned()])
            .collect();
        Tableau::from_rows(rows, labels).unwrap()
    }

    fn textbook() -> Tableau {
        Tableau::from_rows(
            &[
                vec![1., 1., 1., 0., 0., 4.],
                vec![1., 3., 0., 1., 0., 6.],
                vec![-3., -5., 0., 0., 1., 0.],
            ],
            ["x1", "x2", "s1", "s2", "z", "sol"]
                .iter()
                .map(|l| l.to_string())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn textbook_problem_takes_two_pivots() {
        let mut engine = SimplexEngine::new(textbook(), SolverConfig::default());

        let steps = engine.solve().unwrap();

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].step, PivotStep::new(-5., 1, 2., 1, 3.));
        assert_eq!(steps[1].step.pivot_column, 0);
        assert_eq!(steps[1].step.pivot_row, 0);
        assert!(steps.iter().all(|step| step.branch.is_primary()));
        assert!(engine.state().is_optimal());
        assert_abs_diff_eq!(engine.tableau().objective_value(), 14., epsilon = 1e-9);
        assert_abs_diff_eq!(engine.tableau().rhs(0), 3., epsilon = 1e-9);
        assert_abs_diff_eq!(engine.tableau().rhs(1), 1., epsilon = 1e-9);
    }

    #[test]
    fn iteration_budget_is_enforced() {
        let mut engine = SimplexEngine::new(
            textbook(),
            SolverConfig::default().with_max_iterations(1),
        );

        assert_eq!(
            engine.solve().unwrap_err(),
            SolveError::DidNotConverge { iterations: 1 }
        );
    }

    #[test]
    fn budget_equal_to_pivot_count_is_enough() {
        let mut engine = SimplexEngine::new(
            textbook(),
            SolverConfig::default().with_max_iterations(2),
        );

        assert_eq!(engine.solve().unwrap().len(), 2);
    }

    #[test]
    fn unbounded_column_is_reported() {
        let mut engine = SimplexEngine::new(
            tableau(&[vec![-1., 1., 0., 4.], vec![-2., 0., 1., 0.]]),
            SolverConfig::default(),
        );

        assert_eq!(
            engine.solve().unwrap_err(),
            SolveError::Unbounded { column: 0 }
        );
    }

    #[test]
    fn solved_engine_stays_solved() {
        let mut engine = SimplexEngine::new(textbook(), SolverConfig::default());
        engine.solve().unwrap();
        let terminal = engine.tableau().clone();

        assert!(engine.step().unwrap().is_solved());
        assert_eq!(engine.tableau(), &terminal);
        assert_eq!(engine.steps().len(), 2);
    }

    #[test]
    fn manual_pivot_is_logged_on_its_branch() {
        let branch = Branch::Alternate {
            index: 1,
            column: 0,
        };
        let mut engine = SimplexEngine::on_branch(
            tableau(&[
                vec![0.5, 1., 0.5, 0., 0., 2.5],
                vec![0.5, 0., -0.5, 1., 0., 1.5],
                vec![0., 0., 2., 0., 1., 10.],
            ]),
            SolverConfig::default(),
            branch,
        );

        let step = engine.pivot_on(0).unwrap();

        assert_eq!(step, PivotStep::new(0., 0, 3., 1, 0.5));
        assert_eq!(engine.steps()[0].branch, branch);
        assert_eq!(engine.tableau().rhs(0), 1.);
        assert_eq!(engine.tableau().rhs(1), 3.);
    }

    proptest! {
        #[test]
        fn optimal_tableau_is_not_mutated(
            constraints in vec(vec(-10.0..10.0f64, 5), 1..5),
            objective in vec(0.0..10.0f64, 3),
        ) {
            let mut rows = constraints;
            for row in rows.iter_mut() {
                // z column is zero in constraint rows
                row[3] = 0.;
            }
            let mut objective_row = objective;
            objective_row.extend([1., 7.]);
            rows.push(objective_row);
            let initial = tableau(&rows);
            let mut engine = SimplexEngine::new(initial.clone(), SolverConfig::default());

            prop_assert!(engine.step().unwrap().is_solved());
            prop_assert_eq!(engine.tableau(), &initial);
            prop_assert!(engine.steps().is_empty());
        }
    }
}
