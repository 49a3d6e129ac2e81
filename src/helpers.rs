/// Formats `val` with at most `precision` decimals, dropping trailing zeros and a negative sign
/// on zero.
pub fn f64_rounded_string(val: &f64, precision: usize) -> String {
    let formatted = format!("{val:.precision$}");
    let trimmed = if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.')
    } else {
        formatted.as_str()
    };
    match trimmed {
        "-0" => "0".to_owned(),
        other => other.to_owned(),
    }
}
