use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::data::filter::BookingView;
use crate::error::AnalysisResult;

pub const DEFAULT_SAMPLE_CAP: usize = 5000;
pub const DEFAULT_SAMPLE_SEED: u64 = 42;

/// One point of the lead time vs. price scatter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub lead_time: u32,
    pub adr: f64,
    pub is_canceled: bool,
}

/// Positions `0..len` to keep when sampling at most `cap` of them.
///
/// Sorted ascending so the sample preserves row order. The same
/// `(len, cap, seed)` always gives the same positions.
pub fn sample_positions(len: usize, cap: usize, seed: u64) -> Vec<usize> {
    if len <= cap {
        return (0..len).collect();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = rand::seq::index::sample(&mut rng, len, cap).into_vec();
    picked.sort_unstable();
    picked
}

/// Down-sampled raw rows for scatter plotting.
pub fn scatter_sample(
    view: &BookingView<'_>,
    cap: usize,
    seed: u64,
) -> AnalysisResult<Vec<ScatterPoint>> {
    view.ensure_data()?;

    let records: Vec<_> = view.iter().collect();
    let points = sample_positions(records.len(), cap, seed)
        .into_iter()
        .map(|pos| {
            let rec = records[pos];
            ScatterPoint {
                lead_time: rec.lead_time,
                adr: rec.adr,
                is_canceled: rec.is_canceled,
            }
        })
        .collect();
    Ok(points)
}
