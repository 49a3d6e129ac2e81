use std::{fmt, ops::Range};

use nalgebra::DMatrix;
use num_traits::Zero;
use serde::Serialize;

use crate::ensure_eq;

use super::SolveError;

pub const OBJECTIVE_LABEL: &str = "z";
pub const RHS_LABEL: &str = "sol";

/// Dense simplex tableau.
///
/// The last row is the objective row, the last column is the right-hand side and the column
/// before it belongs to the objective value `z`. Every column carries a label.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "TableauRows")]
pub struct Tableau {
    matrix: DMatrix<f64>,
    labels: Vec<String>,
}

#[derive(Serialize)]
struct TableauRows {
    labels: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl From<Tableau> for TableauRows {
    fn from(tableau: Tableau) -> Self {
        Self {
            rows: tableau
                .matrix
                .row_iter()
                .map(|row| row.iter().copied().collect())
                .collect(),
            labels: tableau.labels,
        }
    }
}

impl Tableau {
    pub fn new(matrix: DMatrix<f64>, labels: Vec<String>) -> Result<Self, SolveError> {
        if matrix.nrows() < 2 {
            return Err(SolveError::MalformedTableau {
                reason: format!(
                    "expected at least one constraint row and the objective row, got {} rows",
                    matrix.nrows()
                ),
            });
        }
        if matrix.ncols() < 3 {
            return Err(SolveError::MalformedTableau {
                reason: format!(
                    "expected a variable column plus `{OBJECTIVE_LABEL}` and `{RHS_LABEL}`, \
                     got {} columns",
                    matrix.ncols()
                ),
            });
        }
        ensure_eq!(labels.len(), matrix.ncols());
        ensure_eq!(labels[labels.len() - 2].as_str(), OBJECTIVE_LABEL);
        ensure_eq!(labels[labels.len() - 1].as_str(), RHS_LABEL);

        Ok(Self { matrix, labels })
    }

    /// Builds a tableau from row-major data, checking that every row has one entry per label.
    pub fn from_rows(rows: &[Vec<f64>], labels: Vec<String>) -> Result<Self, SolveError> {
        let ncols = labels.len();
        for row in rows {
            ensure_eq!(row.len(), ncols);
        }
        let data = rows.iter().flatten().copied().collect::<Vec<_>>();
        Self::new(DMatrix::from_row_slice(rows.len(), ncols, &data), labels)
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub(crate) fn matrix_mut(&mut self) -> &mut DMatrix<f64> {
        &mut self.matrix
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label(&self, column: usize) -> &str {
        &self.labels[column]
    }

    pub fn column_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn nrows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.matrix.ncols()
    }

    /// Rows holding constraints, i.e. every row but the objective row.
    pub fn constraint_rows(&self) -> Range<usize> {
        0..self.matrix.nrows() - 1
    }

    /// Columns that may enter the basis: everything left of `z`.
    pub fn variable_columns(&self) -> Range<usize> {
        0..self.matrix.ncols() - 2
    }

    pub fn objective_row(&self) -> usize {
        self.matrix.nrows() - 1
    }

    pub fn rhs_column(&self) -> usize {
        self.matrix.ncols() - 1
    }

    /// Entry of the objective row (the reduced cost) in `column`.
    pub fn objective(&self, column: usize) -> f64 {
        self.matrix[(self.objective_row(), column)]
    }

    pub fn rhs(&self, row: usize) -> f64 {
        self.matrix[(row, self.rhs_column())]
    }

    pub fn objective_value(&self) -> f64 {
        self.rhs(self.objective_row())
    }

    /// Row of the single unit entry when `column` is a unit vector over the constraint rows.
    ///
    /// Every magnitude has to be 0 or 1, the magnitudes have to sum to 1 and the nonzero entry
    /// has to be +1.
    pub fn unit_row(&self, column: usize, tolerance: f64) -> Option<usize> {
        let mut unit_row = None;
        let mut magnitude_sum = 0.;
        for row in self.constraint_rows() {
            let entry = self.matrix[(row, column)];
            if (entry - 1.).abs() <= tolerance {
                unit_row = Some(row);
            } else if entry.abs() > tolerance {
                return None;
            }
            magnitude_sum += entry.abs();
        }
        ((magnitude_sum - 1.).abs() <= tolerance)
            .then_some(unit_row)
            .flatten()
    }

    /// Column that is basic in `row`: a unit column there with a zero objective-row entry.
    pub fn basic_column(&self, row: usize, tolerance: f64) -> Option<usize> {
        self.variable_columns().find(|column| {
            self.unit_row(*column, tolerance) == Some(row)
                && self.objective(*column).abs() <= tolerance
        })
    }

    /// Replaces entries closer to zero than `tolerance` with an exact zero.
    pub(crate) fn snap_to_zero(&mut self, tolerance: f64) {
        self.matrix.iter_mut().for_each(|el| {
            if el.abs() < tolerance {
                *el = Zero::zero();
            }
        });
    }
}

impl fmt::Display for Tableau {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.labels.join("\t"))?;
        write!(f, "{}", self.matrix)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn from_rows_keeps_layout() {
        let tableau = Tableau::from_rows(
            &[
                vec![1., 1., 1., 0., 0., 4.],
                vec![1., 3., 0., 1., 0., 6.],
                vec![-3., -5., 0., 0., 1., 0.],
            ],
            labels(&["x1", "x2", "s1", "s2", "z", "sol"]),
        )
        .unwrap();

        assert_eq!(tableau.nrows(), 3);
        assert_eq!(tableau.ncols(), 6);
        assert_eq!(tableau.constraint_rows(), 0..2);
        assert_eq!(tableau.variable_columns(), 0..4);
        assert_eq!(tableau.objective(1), -5.);
        assert_eq!(tableau.rhs(1), 6.);
        assert_eq!(tableau.column_of("s2"), Some(3));
        assert_eq!(tableau.unit_row(2, 1e-9), Some(0));
        assert_eq!(tableau.unit_row(0, 1e-9), None);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Tableau::from_rows(
            &[vec![1., 1., 0., 4.], vec![-1., 0., 1.]],
            labels(&["x1", "s1", "z", "sol"]),
        )
        .unwrap_err();

        assert!(err.is_malformed_tableau());
    }

    #[test]
    fn trailing_labels_are_checked() {
        let err = Tableau::from_rows(
            &[vec![1., 1., 0., 4.], vec![-1., 0., 1., 0.]],
            labels(&["x1", "s1", "sol", "z"]),
        )
        .unwrap_err();

        assert!(err.is_malformed_tableau());
    }

    #[test]
    fn negated_unit_column_is_not_basic() {
        let tableau = Tableau::from_rows(
            &[
                vec![0., 2., 0., 1.],
                vec![-1., 0., 0., 3.],
                vec![0., -1., 1., 0.],
            ],
            labels(&["x1", "x2", "z", "sol"]),
        )
        .unwrap();

        assert_eq!(tableau.unit_row(0, 1e-9), None);
        assert_eq!(tableau.unit_row(1, 1e-9), None);
        assert_eq!(tableau.unit_row(2, 1e-9), None);
    }

    #[test]
    fn serializes_as_labelled_rows() {
        let tableau = Tableau::from_rows(
            &[vec![1., 0., 2.], vec![-1., 1., 0.]],
            labels(&["x1", "z", "sol"]),
        )
        .unwrap();

        assert_eq!(
            serde_json::to_string(&tableau).unwrap(),
            r#"{"labels":["x1","z","sol"],"rows":[[1.0,0.0,2.0],[-1.0,1.0,0.0]]}"#
        );
    }
}
