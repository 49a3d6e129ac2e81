use num_traits::Zero;

use super::Tableau;

/// Gauss-Jordan step on `(pivot_row, pivot_col)`.
///
/// The pivot row is divided by the pivot value, then every other row with a nonzero entry in the
/// pivot column gets the normalized pivot row, scaled by the entry's magnitude, added (negative
/// entry) or subtracted (positive entry).
pub fn reduce(tableau: &mut Tableau, pivot_row: usize, pivot_col: usize) {
    let matrix = tableau.matrix_mut();
    let pivot_value = matrix[(pivot_row, pivot_col)];
    log::debug!("Pivot element: {pivot_value}");

    // divide all elements in a row by pivot element
    matrix.row_mut(pivot_row).apply(|el| *el /= pivot_value);
    let normalized = matrix.row(pivot_row).into_owned();

    for i in (0..matrix.nrows()).filter(|i| *i != pivot_row) {
        let entry = matrix[(i, pivot_col)];
        if entry.is_zero() {
            continue;
        }
        let multiplier = entry.abs();
        if entry < 0. {
            matrix
                .row_mut(i)
                .zip_apply(&normalized, |el, pivot_el| *el += pivot_el * multiplier);
        } else {
            matrix
                .row_mut(i)
                .zip_apply(&normalized, |el, pivot_el| *el -= pivot_el * multiplier);
        }
    }
}
