use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use super::fields::Dimension;
use super::model::{BookingRecord, BookingStore};
use crate::error::{AnalysisError, AnalysisResult};

// ---------------------------------------------------------------------------
// Filter predicate: which categories are allowed per dimension
// ---------------------------------------------------------------------------

/// Per-dimension selection: maps dimension → set of allowed labels.
/// A dimension that is absent, or whose set is empty, is not filtered.
pub type FilterState = BTreeMap<Dimension, BTreeSet<String>>;

/// Dimensions the dashboard exposes as filters.
pub const FILTER_DIMENSIONS: [Dimension; 2] = [Dimension::HotelType, Dimension::MarketSegment];

/// Initialise a [`FilterState`] with every category selected (show everything).
pub fn init_filter_state(store: &BookingStore) -> FilterState {
    FILTER_DIMENSIONS
        .iter()
        .filter_map(|dim| store.unique_values.get(dim).map(|vals| (*dim, vals.clone())))
        .collect()
}

/// Return indices of bookings that pass all active filters.
///
/// A booking passes a dimension filter when:
/// * the allowed set is empty → passes (no constraint)
/// * the store does not provide the dimension → passes (column missing)
/// * every known category is allowed → passes
/// * its label on that dimension is in the allowed set → passes
///
/// A booking with no label on a constrained dimension fails.
pub fn filtered_indices(store: &BookingStore, filters: &FilterState) -> Vec<usize> {
    let active: Vec<(Dimension, &BTreeSet<String>)> = filters
        .iter()
        .filter(|(dim, allowed)| {
            if allowed.is_empty() {
                return false;
            }
            match store.unique_values.get(*dim) {
                None => false,
                Some(all) => !all.is_subset(allowed),
            }
        })
        .map(|(dim, allowed)| (*dim, allowed))
        .collect();

    store
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            active
                .iter()
                .all(|(dim, allowed)| dim.value(rec).is_some_and(|v| allowed.contains(v)))
        })
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// BookingView – a selected subset of the store
// ---------------------------------------------------------------------------

/// A read-only selection of bookings. Never copies or mutates records.
#[derive(Debug, Clone)]
pub struct BookingView<'a> {
    store: &'a BookingStore,
    indices: Vec<usize>,
}

impl<'a> BookingView<'a> {
    /// The whole store.
    pub fn all(store: &'a BookingStore) -> Self {
        BookingView {
            store,
            indices: (0..store.len()).collect(),
        }
    }

    /// Bookings passing `filters`.
    pub fn select(store: &'a BookingStore, filters: &FilterState) -> Self {
        let indices = filtered_indices(store, filters);
        debug!("Selection keeps {} of {} bookings", indices.len(), store.len());
        BookingView { store, indices }
    }

    /// View over precomputed indices. Out-of-range indices are ignored.
    pub fn from_indices(store: &'a BookingStore, indices: &[usize]) -> Self {
        BookingView {
            store,
            indices: indices.iter().copied().filter(|i| *i < store.len()).collect(),
        }
    }

    pub fn store(&self) -> &'a BookingStore {
        self.store
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a BookingRecord> + '_ {
        let records: &'a [BookingRecord] = &self.store.records;
        self.indices.iter().map(move |&i| &records[i])
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// `NoData` for an empty selection, so aggregations never divide by zero.
    pub fn ensure_data(&self) -> AnalysisResult<()> {
        if self.is_empty() {
            Err(AnalysisError::NoData)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fields::Column;

    fn store() -> BookingStore {
        let rows = [
            ("City Hotel", "Online TA", true),
            ("City Hotel", "Direct", false),
            ("Resort Hotel", "Online TA", false),
            ("Resort Hotel", "Groups", true),
            ("City Hotel", "Groups", true),
        ];
        let records = rows
            .iter()
            .map(|(hotel, segment, canceled)| {
                let mut rec = BookingRecord::new(*hotel, *canceled, 10, 80.0);
                rec.market_segment = Some(segment.to_string());
                rec
            })
            .collect();
        let schema = [
            Column::Hotel,
            Column::IsCanceled,
            Column::LeadTime,
            Column::Adr,
            Column::MarketSegment,
        ]
        .into_iter()
        .collect();
        BookingStore::from_records(records, schema)
    }

    fn allow(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn full_universe_matches_unfiltered_store() {
        let store = store();
        let view = BookingView::select(&store, &init_filter_state(&store));
        assert_eq!(view.len(), store.len());
        assert!(view.iter().zip(&store.records).all(|(a, b)| a == b));
    }

    #[test]
    fn singleton_hotel_filter() {
        let store = store();
        let mut filters = init_filter_state(&store);
        filters.insert(Dimension::HotelType, allow(&["Resort Hotel"]));

        let view = BookingView::select(&store, &filters);
        assert_eq!(view.len(), 2);
        assert!(view.iter().all(|r| r.hotel_type == "Resort Hotel"));
    }

    #[test]
    fn dimensions_combine_with_and() {
        let store = store();
        let mut filters = FilterState::new();
        filters.insert(Dimension::HotelType, allow(&["City Hotel"]));
        filters.insert(Dimension::MarketSegment, allow(&["Groups", "Direct"]));

        assert_eq!(filtered_indices(&store, &filters), vec![1, 4]);
    }

    #[test]
    fn empty_allowed_set_is_unfiltered() {
        let store = store();
        let mut filters = FilterState::new();
        filters.insert(Dimension::MarketSegment, BTreeSet::new());
        assert_eq!(filtered_indices(&store, &filters).len(), store.len());
    }

    #[test]
    fn unmatched_selection_is_no_data() {
        let store = store();
        let mut filters = FilterState::new();
        filters.insert(Dimension::HotelType, allow(&["Airport Hotel"]));

        let view = BookingView::select(&store, &filters);
        assert!(view.is_empty());
        assert_eq!(view.ensure_data(), Err(AnalysisError::NoData));
    }

    #[test]
    fn unavailable_dimension_is_ignored() {
        let store = store();
        let mut filters = FilterState::new();
        filters.insert(Dimension::ArrivalMonth, allow(&["July"]));
        assert_eq!(filtered_indices(&store, &filters).len(), store.len());
    }
}
