/// Min-max normalize `values` into `[0, 1]`.
///
/// A series whose values are all equal (including a single value) maps to
/// all zeros. An empty series stays empty.
///
/// # Examples
///
/// ```
/// use churnmap_score::normalize::min_max;
///
/// assert_eq!(min_max(&[2.0, 4.0, 6.0]), vec![0.0, 0.5, 1.0]);
/// assert_eq!(min_max(&[3.0, 3.0]), vec![0.0, 0.0]);
/// assert!(min_max(&[]).is_empty());
/// ```
pub fn min_max(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if !range.is_finite() || range <= 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - min) / range).collect()
}
