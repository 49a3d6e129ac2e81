use std::{
    collections::{HashSet, VecDeque},
    fmt,
};

use derive_more::IsVariant;
use derive_new::new;
use num_traits::Zero;
use rayon::prelude::{IntoParallelIterator, ParallelIterator};
use serde::Serialize;

use super::{
    engine::{Branch, LoggedStep, SimplexEngine},
    SolverConfig, Tableau,
};

/// How the tableau relates to the problem the user wrote down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, IsVariant)]
pub enum Mode {
    /// The tableau is the maximization problem itself.
    Primal,
    /// The tableau is the dual of a minimization problem.
    Dual,
    /// The tableau maximizes the negated objective of a minimization problem.
    Negated,
}

impl Mode {
    /// Label prefix of the columns that are read off as decision variables.
    pub fn decision_prefix(self) -> char {
        match self {
            Mode::Primal | Mode::Negated => 'x',
            Mode::Dual => 'y',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, new)]
pub struct Assignment {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    pub variables: Vec<Assignment>,
    /// Optimal objective value, reported as `z`.
    pub objective: f64,
}

impl Solution {
    /// Value of `name`, where `z` is the objective value.
    pub fn value(&self, name: &str) -> Option<f64> {
        if name == "z" {
            return Some(self.objective);
        }
        self.variables
            .iter()
            .find_map(|assignment| (assignment.name == name).then_some(assignment.value))
    }

    fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (self.objective - other.objective).abs() <= tolerance
            && self.variables.len() == other.variables.len()
            && self
                .variables
                .iter()
                .zip(&other.variables)
                .all(|(a, b)| a.name == b.name && (a.value - b.value).abs() <= tolerance)
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for Assignment { name, value } in &self.variables {
            write!(f, "{name} = {value}, ")?;
        }
        write!(f, "z = {}", self.objective)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, IsVariant)]
enum Reading {
    Basic(f64),
    Degenerate,
    NonBasic,
}

/// A solution read off a terminal tableau plus the columns that may lead to alternate optima.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub solution: Solution,
    /// Non-unit decision columns with a zero objective-row entry.
    pub degenerate: Vec<usize>,
}

/// Reads the solution of an optimal tableau.
///
/// Unit decision columns take the right-hand side of their unit row, everything else is 0. In
/// [`Mode::Dual`] the primal value of `xj` is the objective-row entry of the slack column `sj`.
/// In [`Mode::Negated`] the objective value is flipped back to the minimized objective.
pub fn read_solution(tableau: &Tableau, mode: Mode, tolerance: f64) -> Extraction {
    let prefix = mode.decision_prefix();
    let decision_columns = tableau
        .variable_columns()
        .filter(|column| tableau.label(*column).starts_with(prefix))
        .collect::<Vec<_>>();

    let readings = decision_columns
        .clone()
        .into_par_iter()
        .map(|column| match tableau.unit_row(column, tolerance) {
            Some(row) => Reading::Basic(tableau.rhs(row)),
            None if tableau.objective(column).is_zero() => Reading::Degenerate,
            None => Reading::NonBasic,
        })
        .collect::<Vec<_>>();

    let mut variables = Vec::new();
    if mode.is_dual() {
        variables.extend(
            tableau
                .variable_columns()
                .filter_map(|column| {
                    let index = tableau.label(column).strip_prefix('s')?;
                    Some(Assignment::new(
                        format!("x{index}"),
                        tableau.objective(column),
                    ))
                }),
        );
    }
    variables.extend(
        decision_columns
            .iter()
            .zip(&readings)
            .map(|(column, reading)| {
                let value = match reading {
                    Reading::Basic(value) => *value,
                    Reading::Degenerate | Reading::NonBasic => Zero::zero(),
                };
                Assignment::new(tableau.label(*column).to_owned(), value)
            }),
    );

    let objective = match mode {
        Mode::Negated => 0. - tableau.objective_value(),
        Mode::Primal | Mode::Dual => tableau.objective_value(),
    };

    Extraction {
        solution: Solution {
            variables,
            objective,
        },
        degenerate: decision_columns
            .into_iter()
            .zip(readings)
            .filter_map(|(column, reading)| reading.is_degenerate().then_some(column))
            .collect(),
    }
}

/// Collects the solution of `terminal` and the alternate optima reachable from it.
///
/// Tableaux wait in a FIFO queue. Each popped tableau contributes its solution (unless an equal
/// one is already known), and each of its degenerate columns that has not been pivoted on yet,
/// neither on the primary path (`used_columns`) nor on an earlier branch, is pivoted into a copy
/// of it. Those pivots are appended to `steps`.
pub fn explore_solutions(
    terminal: Tableau,
    mode: Mode,
    config: SolverConfig,
    used_columns: impl IntoIterator<Item = usize>,
    steps: &mut Vec<LoggedStep>,
) -> Vec<Solution> {
    let mut used = used_columns.into_iter().collect::<HashSet<_>>();
    let mut queue = VecDeque::from([terminal]);
    let mut solutions: Vec<Solution> = Vec::new();
    let mut alternates = 0usize;
    let mut budget_spent = false;

    while let Some(tableau) = queue.pop_front() {
        let Extraction {
            solution,
            degenerate,
        } = read_solution(&tableau, mode, config.tolerance);
        if solutions
            .iter()
            .any(|known| known.approx_eq(&solution, config.tolerance))
        {
            log::debug!("Alternate basis repeats a known solution: {solution}");
        } else {
            log::info!("Solution: {solution}");
            solutions.push(solution);
        }

        for column in degenerate {
            if used.contains(&column) {
                continue;
            }
            if alternates >= config.max_alternates {
                if !budget_spent {
                    log::warn!(
                        "Stopping alternate optimum search after {} pivots",
                        config.max_alternates
                    );
                    budget_spent = true;
                }
                break;
            }
            used.insert(column);

            let branch = Branch::Alternate {
                index: alternates + 1,
                column,
            };
            log::info!(
                "Column {} ({}) has a zero reduced cost, exploring an alternate optimum",
                column,
                tableau.label(column)
            );
            let mut engine = SimplexEngine::on_branch(tableau.clone(), config, branch);
            match engine.pivot_on(column) {
                Ok(_) => {
                    alternates += 1;
                    let (branch_tableau, branch_steps) = engine.into_parts();
                    steps.extend(branch_steps);
                    queue.push_back(branch_tableau);
                }
                Err(err) => log::warn!("Skipping alternate optimum along column {column}: {err}"),
            }
        }
    }

    solutions
}
