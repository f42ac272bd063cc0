//! The dashboard pipeline: one parameterized pass from a selection to every
//! table the presentation layer draws.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::analysis::correlation::{correlation_matrix, CorrelationMatrix};
use crate::analysis::distribution::{distribution, DistributionStats};
use crate::analysis::kpi::{compute_kpis, Kpis};
use crate::analysis::rates::{
    cancellation_rates, rate_of, risk_multiplier, seasonal_extremes, sort_by_rate_desc,
    CategoryRate, SeasonalExtremes,
};
use crate::analysis::sample::{
    scatter_sample, ScatterPoint, DEFAULT_SAMPLE_CAP, DEFAULT_SAMPLE_SEED,
};
use crate::data::fields::{Dimension, NumericField, HAS_SPECIAL_REQUESTS, NO_SPECIAL_REQUESTS};
use crate::data::filter::BookingView;
use crate::data::model::BookingWindow;
use crate::error::{AnalysisError, AnalysisResult};

/// Which room rates count towards the average price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdrPolicy {
    /// Every booking, including complimentary (0) and erroneous negative rates.
    All,
    /// Only bookings with a strictly positive rate.
    #[default]
    PositiveOnly,
}

impl AdrPolicy {
    pub fn includes(self, adr: f64) -> bool {
        match self {
            AdrPolicy::All => true,
            AdrPolicy::PositiveOnly => adr > 0.0,
        }
    }
}

/// Knobs that distinguish one dashboard flavour from another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardProfile {
    pub adr_policy: AdrPolicy,
    /// Remove bookings with zero guests while loading.
    pub drop_empty_parties: bool,
    pub sample_cap: usize,
    pub sample_seed: u64,
    pub correlation_fields: Vec<NumericField>,
    pub distribution_fields: Vec<NumericField>,
}

impl Default for DashboardProfile {
    fn default() -> Self {
        Self {
            adr_policy: AdrPolicy::PositiveOnly,
            drop_empty_parties: false,
            sample_cap: DEFAULT_SAMPLE_CAP,
            sample_seed: DEFAULT_SAMPLE_SEED,
            correlation_fields: vec![
                NumericField::IsCanceled,
                NumericField::LeadTime,
                NumericField::Adr,
                NumericField::TotalNights,
                NumericField::TotalGuests,
                NumericField::TotalOfSpecialRequests,
            ],
            distribution_fields: vec![
                NumericField::LeadTime,
                NumericField::Adr,
                NumericField::TotalNights,
                NumericField::TotalGuests,
                NumericField::TotalOfSpecialRequests,
                NumericField::BookingChanges,
                NumericField::DaysInWaitingList,
            ],
        }
    }
}

/// Ratios between group cancellation rates. `None` means undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskMultipliers {
    /// "Way ahead" rate over "Last minute" rate.
    pub far_vs_last_minute: Option<f64>,
    /// Rate without special requests over rate with them.
    pub no_requests_vs_requests: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyCorrelation {
    pub field: NumericField,
    pub with_cancellation: Option<f64>,
}

/// All tables for one selection. Views whose source column is missing
/// from the dataset are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardViews {
    pub base_bookings: usize,
    pub kpis: Kpis,
    pub by_hotel: Vec<CategoryRate>,
    pub by_booking_window: Vec<CategoryRate>,
    pub by_special_requests: Option<Vec<CategoryRate>>,
    pub by_market_segment: Option<Vec<CategoryRate>>,
    pub by_month: Option<Vec<CategoryRate>>,
    pub seasonal: Option<SeasonalExtremes>,
    pub risk: RiskMultipliers,
    pub correlation: Option<CorrelationMatrix>,
    pub key_correlations: Vec<KeyCorrelation>,
    pub distributions: Vec<DistributionStats>,
    pub scatter: Vec<ScatterPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DashboardReport {
    /// The selection matched no bookings.
    NoData,
    Ready(Box<DashboardViews>),
}

impl DashboardReport {
    pub fn views(&self) -> Option<&DashboardViews> {
        match self {
            DashboardReport::NoData => None,
            DashboardReport::Ready(views) => Some(views),
        }
    }
}

/// Missing columns make a view disappear; anything else is a real error.
fn optional<T>(result: AnalysisResult<T>) -> AnalysisResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(
            err @ (AnalysisError::DimensionUnavailable(_)
            | AnalysisError::NumericUnavailable(_)
            | AnalysisError::InsufficientFields(_)),
        ) => {
            warn!("Omitting view: {err}");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Compute every dashboard table for `view`.
pub fn compute_views(
    view: &BookingView<'_>,
    profile: &DashboardProfile,
) -> AnalysisResult<DashboardViews> {
    view.ensure_data()?;

    let kpis = compute_kpis(view, profile.adr_policy)?;
    let by_hotel = cancellation_rates(view, Dimension::HotelType)?;
    let by_booking_window = cancellation_rates(view, Dimension::BookingWindow)?;
    let by_special_requests = optional(cancellation_rates(view, Dimension::HasSpecialRequests))?;
    let by_market_segment =
        optional(cancellation_rates(view, Dimension::MarketSegment))?.map(|mut rates| {
            sort_by_rate_desc(&mut rates);
            rates
        });
    let by_month = optional(cancellation_rates(view, Dimension::ArrivalMonth))?;
    let seasonal = by_month.as_deref().map(seasonal_extremes);

    let risk = RiskMultipliers {
        far_vs_last_minute: risk_multiplier(
            rate_of(&by_booking_window, BookingWindow::WayAhead.label()),
            rate_of(&by_booking_window, BookingWindow::LastMinute.label()),
        ),
        no_requests_vs_requests: by_special_requests.as_deref().and_then(|rates| {
            risk_multiplier(
                rate_of(rates, NO_SPECIAL_REQUESTS),
                rate_of(rates, HAS_SPECIAL_REQUESTS),
            )
        }),
    };

    let correlation = optional(correlation_matrix(view, &profile.correlation_fields))?;
    let key_correlations = correlation
        .as_ref()
        .map(|m| {
            m.row(NumericField::IsCanceled)
                .into_iter()
                .map(|(field, with_cancellation)| KeyCorrelation {
                    field,
                    with_cancellation,
                })
                .collect()
        })
        .unwrap_or_default();

    let mut distributions = Vec::new();
    for field in &profile.distribution_fields {
        match distribution(view, *field) {
            Ok(stats) => distributions.push(stats),
            Err(AnalysisError::NumericUnavailable(_)) => {}
            Err(AnalysisError::NoData) => warn!("No values for {}", field.as_str()),
            Err(err) => return Err(err),
        }
    }

    let scatter = scatter_sample(view, profile.sample_cap, profile.sample_seed)?;

    Ok(DashboardViews {
        base_bookings: view.store().len(),
        kpis,
        by_hotel,
        by_booking_window,
        by_special_requests,
        by_market_segment,
        by_month,
        seasonal,
        risk,
        correlation,
        key_correlations,
        distributions,
        scatter,
    })
}

/// [`compute_views`] with an empty selection folded into [`DashboardReport::NoData`].
pub fn build_report(
    view: &BookingView<'_>,
    profile: &DashboardProfile,
) -> AnalysisResult<DashboardReport> {
    match compute_views(view, profile) {
        Ok(views) => Ok(DashboardReport::Ready(Box::new(views))),
        Err(AnalysisError::NoData) => Ok(DashboardReport::NoData),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::derive::derive_features;
    use crate::data::fields::Column;
    use crate::data::model::{BookingRecord, BookingStore};

    fn store(with_segments: bool) -> BookingStore {
        let rows = [
            (true, 250, 0, "Groups"),
            (true, 200, 0, "Groups"),
            (false, 210, 1, "Direct"),
            (true, 10, 0, "Online TA"),
            (false, 5, 2, "Direct"),
            (false, 15, 0, "Online TA"),
        ];
        let records = rows
            .iter()
            .map(|(canceled, lead, requests, segment)| {
                let mut rec = BookingRecord::new("City Hotel", *canceled, *lead, 100.0);
                rec.total_of_special_requests = Some(*requests);
                rec.market_segment = with_segments.then(|| segment.to_string());
                rec
            })
            .collect();
        let mut schema: std::collections::BTreeSet<Column> =
            Column::REQUIRED.into_iter().collect();
        schema.insert(Column::TotalOfSpecialRequests);
        if with_segments {
            schema.insert(Column::MarketSegment);
        }
        let mut store = BookingStore::from_records(records, schema);
        derive_features(&mut store);
        store
    }

    #[test]
    fn full_report() {
        let store = store(true);
        let views = compute_views(&BookingView::all(&store), &DashboardProfile::default()).unwrap();

        assert_eq!(views.kpis.cancellations, 3);
        assert_eq!(views.by_booking_window.len(), 4);
        // Way ahead 2/3, last minute 1/3.
        let far = views.risk.far_vs_last_minute.unwrap();
        assert!((far - 2.0).abs() < 1e-9);
        // No requests: 3 of 4 canceled; with requests: 0 of 2.
        assert_eq!(views.risk.no_requests_vs_requests, None);

        let segments = views.by_market_segment.unwrap();
        assert_eq!(segments[0].category, "Groups");
        assert_eq!(segments.last().unwrap().category, "Direct");

        assert!(views.by_month.is_none());
        assert!(views.seasonal.is_none());
        assert_eq!(views.scatter.len(), 6);
        assert_eq!(views.key_correlations.len(), 3);
        let fields: Vec<_> = views.distributions.iter().map(|d| d.field).collect();
        assert_eq!(
            fields,
            [NumericField::LeadTime, NumericField::Adr, NumericField::TotalOfSpecialRequests]
        );
    }

    #[test]
    fn missing_segment_column_omits_view() {
        let store = store(false);
        let views = compute_views(&BookingView::all(&store), &DashboardProfile::default()).unwrap();
        assert!(views.by_market_segment.is_none());
        assert!(views.by_special_requests.is_some());
    }

    #[test]
    fn empty_selection_reports_no_data() {
        let store = store(true);
        let empty = BookingView::from_indices(&store, &[]);
        let report = build_report(&empty, &DashboardProfile::default()).unwrap();
        assert_eq!(report, DashboardReport::NoData);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "no_data");
    }

    #[test]
    fn profile_deserializes_with_defaults() {
        let profile: DashboardProfile =
            serde_json::from_str(r#"{"adr_policy": "all", "sample_cap": 100}"#).unwrap();
        assert_eq!(profile.adr_policy, AdrPolicy::All);
        assert_eq!(profile.sample_cap, 100);
        assert_eq!(profile.sample_seed, DEFAULT_SAMPLE_SEED);
        assert!(!profile.drop_empty_parties);
    }
}
