use std::collections::BTreeMap;

use serde::Serialize;

use super::percent;
use crate::data::fields::{Dimension, HAS_SPECIAL_REQUESTS, NO_SPECIAL_REQUESTS};
use crate::data::filter::BookingView;
use crate::data::model::{BookingWindow, Month};
use crate::error::{AnalysisError, AnalysisResult};

/// Cancellation rate of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRate {
    pub category: String,
    pub bookings: usize,
    pub cancellations: usize,
    /// Percent; 0 for a category with no bookings.
    pub rate: f64,
}

/// Fixed display order for dimensions with a known category universe.
pub fn canonical_order(dim: Dimension) -> Option<Vec<&'static str>> {
    match dim {
        Dimension::BookingWindow => Some(BookingWindow::ALL.iter().map(|w| w.label()).collect()),
        Dimension::ArrivalMonth => Some(Month::ALL.iter().map(|m| m.name()).collect()),
        Dimension::HasSpecialRequests => Some(vec![NO_SPECIAL_REQUESTS, HAS_SPECIAL_REQUESTS]),
        Dimension::HotelType | Dimension::MarketSegment => None,
    }
}

/// Per-category `mean(is_canceled) * 100` on `dim`, in the dimension's
/// canonical order when it has one, else ascending by label.
pub fn cancellation_rates(
    view: &BookingView<'_>,
    dim: Dimension,
) -> AnalysisResult<Vec<CategoryRate>> {
    let order = canonical_order(dim);
    cancellation_rates_ordered(view, dim, order.as_deref())
}

/// Per-category cancellation rate with an explicit ordering.
///
/// With `order`, exactly those categories are returned in that order, and a
/// category without bookings gets rate 0. Without it, every observed
/// category is returned ascending by label.
pub fn cancellation_rates_ordered(
    view: &BookingView<'_>,
    dim: Dimension,
    order: Option<&[&str]>,
) -> AnalysisResult<Vec<CategoryRate>> {
    view.ensure_data()?;
    if !view.store().provides(dim.source()) {
        return Err(AnalysisError::DimensionUnavailable(dim));
    }

    // category -> (bookings, cancellations)
    let mut groups: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for rec in view.iter() {
        if let Some(category) = dim.value(rec) {
            let entry = groups.entry(category).or_default();
            entry.0 += 1;
            if rec.is_canceled {
                entry.1 += 1;
            }
        }
    }

    let rate = |category: &str, (bookings, cancellations): (usize, usize)| CategoryRate {
        category: category.to_string(),
        bookings,
        cancellations,
        rate: percent(cancellations, bookings),
    };

    let rates = match order {
        Some(order) => order
            .iter()
            .map(|category| rate(category, groups.get(category).copied().unwrap_or_default()))
            .collect(),
        None => groups
            .into_iter()
            .map(|(category, counts)| rate(category, counts))
            .collect(),
    };
    Ok(rates)
}

/// Reorder highest rate first; ties keep their relative order.
pub fn sort_by_rate_desc(rates: &mut [CategoryRate]) {
    rates.sort_by(|a, b| b.rate.total_cmp(&a.rate));
}

/// Rate of `category`, 0 when it is not listed.
pub fn rate_of(rates: &[CategoryRate], category: &str) -> f64 {
    rates
        .iter()
        .find(|r| r.category == category)
        .map_or(0.0, |r| r.rate)
}

/// `numerator / denominator` between two group rates; `None` (undefined)
/// when the denominator is zero.
pub fn risk_multiplier(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator != 0.0 && denominator.is_finite() && numerator.is_finite())
        .then(|| numerator / denominator)
}

/// Seasonal highlights from a month-ordered rate table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalExtremes {
    /// Highest rate over May to August.
    pub summer_peak: f64,
    /// Lowest rate over December to February.
    pub winter_low: f64,
}

pub fn seasonal_extremes(month_rates: &[CategoryRate]) -> SeasonalExtremes {
    let rate = |m: Month| rate_of(month_rates, m.name());
    let summer = [Month::May, Month::June, Month::July, Month::August];
    let winter = [Month::December, Month::January, Month::February];

    SeasonalExtremes {
        summer_peak: summer.into_iter().map(rate).fold(f64::NEG_INFINITY, f64::max),
        winter_low: winter.into_iter().map(rate).fold(f64::INFINITY, f64::min),
    }
}
