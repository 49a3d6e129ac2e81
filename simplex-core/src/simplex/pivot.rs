use derive_more::IsVariant;
use derive_new::new;
use serde::Serialize;

use super::{SolveError, SolveResult, Tableau};

/// One pivot decision, kept for the derivation trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, new)]
pub struct PivotStep {
    /// Objective-row entry of the entering column.
    pub most_negative: f64,
    pub pivot_column: usize,
    pub smallest_ratio: f64,
    pub pivot_row: usize,
    pub pivot_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, IsVariant)]
pub enum Selection {
    Optimal,
    Pivot(PivotStep),
}

/// Chooses the next pivot.
///
/// Without `manual_column` the entering column is the most negative objective-row entry, and a
/// tableau without negative entries is reported as optimal. With `manual_column` that column
/// enters regardless of its reduced cost.
pub fn select_pivot(tableau: &Tableau, manual_column: Option<usize>) -> SolveResult<Selection> {
    let (column, most_negative) = match manual_column {
        Some(column) => (column, tableau.objective(column)),
        None => match most_negative_column(tableau) {
            Some((column, most_negative)) if most_negative < 0. => (column, most_negative),
            _ => return Ok(Selection::Optimal),
        },
    };

    pivot_step(tableau, column, most_negative).map(Selection::Pivot)
}

/// Completes a pivot decision for an entering `column` with the minimum-ratio test.
pub fn pivot_step(tableau: &Tableau, column: usize, most_negative: f64) -> SolveResult<PivotStep> {
    let (pivot_row, smallest_ratio) =
        smallest_ratio_row(tableau, column).ok_or(SolveError::Unbounded { column })?;

    Ok(PivotStep::new(
        most_negative,
        column,
        smallest_ratio,
        pivot_row,
        tableau.matrix()[(pivot_row, column)],
    ))
}

/// Lowest objective-row entry among the variable columns; the first one wins a tie.
pub fn most_negative_column(tableau: &Tableau) -> Option<(usize, f64)> {
    tableau
        .variable_columns()
        .map(|column| (column, tableau.objective(column)))
        .reduce(|best, candidate| if candidate.1 < best.1 { candidate } else { best })
}

/// Minimum-ratio test over the constraint rows with a positive entry in `column`; the first
/// row wins a tie.
pub fn smallest_ratio_row(tableau: &Tableau, column: usize) -> Option<(usize, f64)> {
    let matrix = tableau.matrix();
    tableau
        .constraint_rows()
        .filter_map(|row| {
            let entry = matrix[(row, column)];
            (entry > 0.).then(|| (row, tableau.rhs(row) / entry))
        })
        .filter(|(_, ratio)| *ratio >= 0.)
        .reduce(|best, candidate| if candidate.1 < best.1 { candidate } else { best })
}
