/// Aggregations over a [`BookingView`](crate::data::filter::BookingView).
///
/// Every operation is a pure function of the view and returns
/// [`AnalysisError::NoData`](crate::error::AnalysisError::NoData) for an
/// empty selection instead of dividing by zero.
pub mod correlation;
pub mod distribution;
pub mod kpi;
pub mod rates;
pub mod sample;

/// `part / whole` as a percentage; 0 when `whole` is 0.
pub(crate) fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 * 100.0) / whole as f64
}

/// Arithmetic mean, `None` for no values.
pub(crate) fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
