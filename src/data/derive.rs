use std::collections::BTreeSet;

use log::{info, warn};

use super::fields::{Column, DerivedField};
use super::model::{BookingRecord, BookingStore, BookingWindow, DerivedFields};

/// Source columns each derived field needs in the schema.
fn prerequisites(field: DerivedField) -> &'static [Column] {
    match field {
        DerivedField::TotalNights => &[Column::StaysInWeekendNights, Column::StaysInWeekNights],
        DerivedField::TotalGuests => &[Column::Adults],
        DerivedField::BookingWindow => &[Column::LeadTime],
        DerivedField::HasSpecialRequests => &[Column::TotalOfSpecialRequests],
    }
}

const ALL_DERIVED: [DerivedField; 4] = [
    DerivedField::TotalNights,
    DerivedField::TotalGuests,
    DerivedField::BookingWindow,
    DerivedField::HasSpecialRequests,
];

/// Derived fields whose prerequisite columns are all in `schema`.
pub fn derivable(schema: &BTreeSet<Column>) -> BTreeSet<DerivedField> {
    ALL_DERIVED
        .into_iter()
        .filter(|field| prerequisites(*field).iter().all(|col| schema.contains(col)))
        .collect()
}

/// Columns in which a null value drops the row before derivation.
///
/// That is the required columns plus every prerequisite of a derivable
/// field. `children` and `babies` are never listed: `total_guests` counts a
/// missing value as zero.
pub fn row_required_columns(schema: &BTreeSet<Column>) -> BTreeSet<Column> {
    let mut cols: BTreeSet<Column> = Column::REQUIRED.into_iter().collect();
    for field in derivable(schema) {
        cols.extend(prerequisites(field).iter().copied());
    }
    cols
}

/// Compute the derived fields of a single record.
///
/// Only the fields in `available` are set; the rest stay `None`. The result
/// depends on source fields alone, so running it twice gives the same values.
pub fn derive_record(rec: &BookingRecord, available: &BTreeSet<DerivedField>) -> DerivedFields {
    let wants = |field: DerivedField| available.contains(&field);

    let total_nights = if wants(DerivedField::TotalNights) {
        rec.stays_in_weekend_nights
            .zip(rec.stays_in_week_nights)
            .map(|(weekend, week)| u64::from(weekend) + u64::from(week))
    } else {
        None
    };

    let total_guests = if wants(DerivedField::TotalGuests) {
        rec.adults
            .map(|adults| adults + rec.children.unwrap_or(0.0) + rec.babies.unwrap_or(0.0))
    } else {
        None
    };

    let booking_window = wants(DerivedField::BookingWindow)
        .then(|| BookingWindow::from_lead_time(rec.lead_time));

    let has_special_requests = if wants(DerivedField::HasSpecialRequests) {
        rec.total_of_special_requests.map(|n| n > 0)
    } else {
        None
    };

    DerivedFields {
        total_nights,
        total_guests,
        booking_window,
        has_special_requests,
    }
}

/// Run the derivation pass over the whole store and refresh its index.
pub fn derive_features(store: &mut BookingStore) {
    let available = derivable(&store.schema);
    for field in ALL_DERIVED {
        if !available.contains(&field) {
            warn!("Skipping derived field {field:?}: prerequisite column missing");
        }
    }

    for rec in &mut store.records {
        rec.derived = derive_record(rec, &available);
    }
    store.derived = available;
    store.rebuild_index();

    info!(
        "Derived {:?} for {} bookings",
        store.derived,
        store.records.len()
    );
}

/// Remove bookings whose derived party size is zero. Returns how many went.
///
/// No-op when `total_guests` could not be derived.
pub fn drop_empty_parties(store: &mut BookingStore) -> usize {
    if !store.derived.contains(&DerivedField::TotalGuests) {
        return 0;
    }
    let before = store.len();
    store.retain(|rec| rec.derived.total_guests.is_some_and(|g| g > 0.0));
    let dropped = before - store.len();
    if dropped > 0 {
        info!("Dropped {dropped} bookings with no guests");
    }
    dropped
}
