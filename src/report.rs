use std::fmt;

use nalgebra::DMatrix;
use serde::Serialize;
use simplex_core::{Branch, LoggedStep, Mode, Outcome, Solution, SolverConfig, Tableau};

use crate::helpers::f64_rounded_string;

/// Tableau dump with a label header and right-aligned columns.
pub struct TableauView<'a> {
    pub tableau: &'a Tableau,
    pub precision: usize,
}

impl<'a> TableauView<'a> {
    pub fn new(tableau: &'a Tableau, precision: usize) -> Self {
        Self { tableau, precision }
    }
}

impl fmt::Display for TableauView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let matrix = self.tableau.matrix();
        let cells = DMatrix::from_fn(matrix.nrows(), matrix.ncols(), |i, j| {
            f64_rounded_string(&matrix[(i, j)], self.precision)
        });
        let widths = cells
            .column_iter()
            .zip(self.tableau.labels())
            .map(|(column, label)| {
                column
                    .iter()
                    .map(|cell| cell.chars().count())
                    .chain([label.chars().count()])
                    .max()
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>();

        write_aligned(f, self.tableau.labels().iter(), &widths)?;
        for row in cells.row_iter() {
            write_aligned(f, row.iter(), &widths)?;
        }
        Ok(())
    }
}

fn write_aligned<'a>(
    f: &mut fmt::Formatter<'_>,
    cells: impl Iterator<Item = &'a String>,
    widths: &[usize],
) -> fmt::Result {
    let line = cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell:>width$}", width = *width))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(f, "{line}")
}

struct SolutionView<'a> {
    solution: &'a Solution,
    precision: usize,
}

impl fmt::Display for SolutionView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for assignment in &self.solution.variables {
            write!(
                f,
                "{} = {}, ",
                assignment.name,
                f64_rounded_string(&assignment.value, self.precision)
            )?;
        }
        write!(
            f,
            "z = {}",
            f64_rounded_string(&self.solution.objective, self.precision)
        )
    }
}

/// Human-readable derivation: the starting tableau, every pivot with the tableau it produced and
/// the optimal solutions.
pub struct TextReport<'a> {
    pub outcome: &'a Outcome,
    pub precision: usize,
}

impl<'a> TextReport<'a> {
    pub fn new(outcome: &'a Outcome, precision: usize) -> Self {
        Self { outcome, precision }
    }

    fn num(&self, val: f64) -> String {
        f64_rounded_string(&val, self.precision)
    }

    fn view(&self, tableau: &'a Tableau) -> TableauView<'a> {
        TableauView::new(tableau, self.precision)
    }

    fn solution(&self, solution: &'a Solution) -> SolutionView<'a> {
        SolutionView {
            solution,
            precision: self.precision,
        }
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = self.outcome;
        match outcome.mode {
            Mode::Dual => writeln!(
                f,
                "Minimization solved through its dual; \
                 x values are read from the objective row of the slack columns.\n"
            )?,
            Mode::Negated => writeln!(
                f,
                "Minimization solved by maximizing the negated objective; \
                 z is the minimized objective.\n"
            )?,
            Mode::Primal => {}
        }
        writeln!(f, "Initial tableau:\n{}", self.view(&outcome.initial))?;

        let mut iteration = 0usize;
        for LoggedStep {
            branch,
            step,
            tableau,
        } in &outcome.steps
        {
            match branch {
                Branch::Primary => {
                    iteration += 1;
                    writeln!(f, "Iteration {iteration}")?;
                    writeln!(
                        f,
                        "Most negative value in the objective row is {} in column {} ({})",
                        self.num(step.most_negative),
                        step.pivot_column,
                        tableau.label(step.pivot_column)
                    )?;
                }
                Branch::Alternate { index, column } => {
                    writeln!(f, "Alternate optimum {index}")?;
                    writeln!(
                        f,
                        "Column {} ({}) has objective-row value {}, pivoting it into the basis",
                        column,
                        tableau.label(*column),
                        self.num(step.most_negative)
                    )?;
                }
            }
            writeln!(
                f,
                "Smallest ratio is {} in row {}",
                self.num(step.smallest_ratio),
                step.pivot_row
            )?;
            writeln!(f, "Pivot value is {}", self.num(step.pivot_value))?;
            writeln!(f, "{}", self.view(tableau))?;
        }

        match outcome.solutions.as_slice() {
            [solution] => writeln!(f, "Optimal solution: {}", self.solution(solution)),
            solutions => {
                writeln!(f, "Optimal solutions ({}):", solutions.len())?;
                for (i, solution) in solutions.iter().enumerate() {
                    writeln!(f, "{}) {}", i + 1, self.solution(solution))?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    input: &'a str,
    config: &'a SolverConfig,
    outcome: &'a Outcome,
}

/// The whole outcome as pretty-printed JSON, together with the input and settings it came from.
pub fn json_report(
    input: &str,
    config: &SolverConfig,
    outcome: &Outcome,
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        input,
        config,
        outcome,
    })
}
