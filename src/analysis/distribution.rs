use serde::Serialize;

use super::mean;
use crate::data::fields::NumericField;
use crate::data::filter::BookingView;
use crate::error::{AnalysisError, AnalysisResult};

/// Five-number summary plus mean over the non-missing values of a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionStats {
    pub field: NumericField,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub mean: f64,
    pub q3: f64,
    pub max: f64,
}

pub fn distribution(
    view: &BookingView<'_>,
    field: NumericField,
) -> AnalysisResult<DistributionStats> {
    view.ensure_data()?;
    if !view.store().provides(field.source()) {
        return Err(AnalysisError::NumericUnavailable(field));
    }

    let mut values: Vec<f64> = view.iter().filter_map(|rec| field.value(rec)).collect();
    if values.is_empty() {
        return Err(AnalysisError::NoData);
    }
    values.sort_by(f64::total_cmp);

    Ok(DistributionStats {
        field,
        count: values.len(),
        min: values[0],
        q1: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        mean: mean(values.iter().copied()).unwrap_or(f64::NAN),
        q3: quantile(&values, 0.75),
        max: values[values.len() - 1],
    })
}

/// Quantile of already sorted, non-empty data, interpolating linearly
/// between the two closest ranks.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
