use std::collections::BTreeSet;
use std::sync::Arc;

use log::debug;

use crate::dashboard::{build_report, DashboardProfile, DashboardReport};
use crate::data::fields::Dimension;
use crate::data::filter::{filtered_indices, init_filter_state, BookingView, FilterState};
use crate::data::model::BookingStore;
use crate::error::AnalysisResult;

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Interactive state over one immutable base dataset.
pub struct Session {
    /// Shared, already derived dataset.
    base: Arc<BookingStore>,

    /// Dashboard flavour the reports are built with.
    profile: DashboardProfile,

    /// Per-dimension filter selections.
    filters: FilterState,

    /// Indices of bookings passing the current filters (cached).
    visible_indices: Vec<usize>,
}

impl Session {
    /// Start with every category selected.
    pub fn new(base: Arc<BookingStore>, profile: DashboardProfile) -> Self {
        let filters = init_filter_state(&base);
        let visible_indices = (0..base.len()).collect();
        Self {
            base,
            profile,
            filters,
            visible_indices,
        }
    }

    pub fn base(&self) -> &BookingStore {
        &self.base
    }

    pub fn profile(&self) -> &DashboardProfile {
        &self.profile
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// Known categories of a dimension, `None` if the dataset lacks it.
    pub fn categories(&self, dim: Dimension) -> Option<&BTreeSet<String>> {
        self.base.unique_values.get(&dim)
    }

    /// Number of bookings passing the current filters.
    pub fn visible_count(&self) -> usize {
        self.visible_indices.len()
    }

    /// The current selection.
    pub fn view(&self) -> BookingView<'_> {
        BookingView::from_indices(&self.base, &self.visible_indices)
    }

    /// Recompute `visible_indices` after filter change.
    pub fn refilter(&mut self) {
        self.visible_indices = filtered_indices(&self.base, &self.filters);
        debug!(
            "Refiltered: {} of {} bookings visible",
            self.visible_indices.len(),
            self.base.len()
        );
    }

    /// Toggle a single category in a dimension's filter.
    pub fn toggle_filter_value(&mut self, dim: Dimension, value: &str) {
        let selected = self.filters.entry(dim).or_default();
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    /// Select every known category of a dimension.
    pub fn select_all(&mut self, dim: Dimension) {
        if let Some(all_vals) = self.base.unique_values.get(&dim) {
            self.filters.insert(dim, all_vals.clone());
            self.refilter();
        }
    }

    /// Clear a dimension's selection. An empty selection does not filter.
    pub fn select_none(&mut self, dim: Dimension) {
        self.filters.insert(dim, BTreeSet::new());
        self.refilter();
    }

    /// Replace a dimension's selection.
    pub fn set_selection(&mut self, dim: Dimension, values: impl IntoIterator<Item = String>) {
        self.filters.insert(dim, values.into_iter().collect());
        self.refilter();
    }

    /// Build every dashboard table for the current selection.
    pub fn report(&self) -> AnalysisResult<DashboardReport> {
        build_report(&self.view(), &self.profile)
    }
}
