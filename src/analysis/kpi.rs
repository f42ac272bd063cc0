use serde::Serialize;

use super::{mean, percent};
use crate::dashboard::AdrPolicy;
use crate::data::filter::BookingView;
use crate::error::AnalysisResult;

/// Headline numbers for a selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_bookings: usize,
    pub cancellations: usize,
    pub completed: usize,
    /// Percent of bookings canceled.
    pub cancellation_rate: f64,
    /// Days.
    pub mean_lead_time: f64,
    /// `None` when the ADR policy leaves no bookings to average.
    pub mean_adr: Option<f64>,
}

pub fn compute_kpis(view: &BookingView<'_>, adr_policy: AdrPolicy) -> AnalysisResult<Kpis> {
    view.ensure_data()?;

    let total_bookings = view.len();
    let cancellations = view.iter().filter(|r| r.is_canceled).count();
    let mean_lead_time = mean(view.iter().map(|r| f64::from(r.lead_time))).unwrap_or(0.0);
    let mean_adr = mean(
        view.iter()
            .map(|r| r.adr)
            .filter(|adr| adr_policy.includes(*adr)),
    );

    Ok(Kpis {
        total_bookings,
        cancellations,
        completed: total_bookings - cancellations,
        cancellation_rate: percent(cancellations, total_bookings),
        mean_lead_time,
        mean_adr,
    })
}
