//! Typed names for the columns, dimensions and numeric fields of a booking.

use serde::{Deserialize, Serialize};

use super::model::BookingRecord;

// ---------------------------------------------------------------------------
// Column – a recognised input header
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Hotel,
    IsCanceled,
    LeadTime,
    Adr,
    ArrivalMonth,
    MarketSegment,
    StaysInWeekendNights,
    StaysInWeekNights,
    Adults,
    Children,
    Babies,
    TotalOfSpecialRequests,
    BookingChanges,
    DaysInWaitingList,
}

impl Column {
    pub const ALL: [Column; 14] = [
        Column::Hotel,
        Column::IsCanceled,
        Column::LeadTime,
        Column::Adr,
        Column::ArrivalMonth,
        Column::MarketSegment,
        Column::StaysInWeekendNights,
        Column::StaysInWeekNights,
        Column::Adults,
        Column::Children,
        Column::Babies,
        Column::TotalOfSpecialRequests,
        Column::BookingChanges,
        Column::DaysInWaitingList,
    ];

    /// Columns without which the dataset cannot be used at all.
    pub const REQUIRED: [Column; 4] = [
        Column::Hotel,
        Column::IsCanceled,
        Column::LeadTime,
        Column::Adr,
    ];

    /// Canonical header name.
    pub fn name(self) -> &'static str {
        match self {
            Column::Hotel => "hotel_type",
            Column::IsCanceled => "is_canceled",
            Column::LeadTime => "lead_time",
            Column::Adr => "adr",
            Column::ArrivalMonth => "arrival_month",
            Column::MarketSegment => "market_segment",
            Column::StaysInWeekendNights => "stays_in_weekend_nights",
            Column::StaysInWeekNights => "stays_in_week_nights",
            Column::Adults => "adults",
            Column::Children => "children",
            Column::Babies => "babies",
            Column::TotalOfSpecialRequests => "total_of_special_requests",
            Column::BookingChanges => "booking_changes",
            Column::DaysInWaitingList => "days_in_waiting_list",
        }
    }

    /// Header spellings found in the public hotel-bookings export.
    fn alias(self) -> Option<&'static str> {
        match self {
            Column::Hotel => Some("hotel"),
            Column::ArrivalMonth => Some("arrival_date_month"),
            _ => None,
        }
    }

    /// Map a raw header to a column; unknown headers yield `None`.
    pub fn from_header(header: &str) -> Option<Column> {
        let header = header.trim();
        Column::ALL
            .into_iter()
            .find(|col| col.name() == header || col.alias() == Some(header))
    }
}

// ---------------------------------------------------------------------------
// DerivedField / Source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedField {
    TotalNights,
    TotalGuests,
    BookingWindow,
    HasSpecialRequests,
}

/// Where a field's value comes from: the input file or the feature deriver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Column(Column),
    Derived(DerivedField),
}

// ---------------------------------------------------------------------------
// Dimension – a categorical grouping key
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    HotelType,
    MarketSegment,
    ArrivalMonth,
    BookingWindow,
    HasSpecialRequests,
}

pub const NO_SPECIAL_REQUESTS: &str = "No Special Requests";
pub const HAS_SPECIAL_REQUESTS: &str = "Has Special Requests";

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::HotelType,
        Dimension::MarketSegment,
        Dimension::ArrivalMonth,
        Dimension::BookingWindow,
        Dimension::HasSpecialRequests,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::HotelType => "hotel_type",
            Dimension::MarketSegment => "market_segment",
            Dimension::ArrivalMonth => "arrival_month",
            Dimension::BookingWindow => "booking_window",
            Dimension::HasSpecialRequests => "has_special_requests",
        }
    }

    pub fn source(self) -> Source {
        match self {
            Dimension::HotelType => Source::Column(Column::Hotel),
            Dimension::MarketSegment => Source::Column(Column::MarketSegment),
            Dimension::ArrivalMonth => Source::Column(Column::ArrivalMonth),
            Dimension::BookingWindow => Source::Derived(DerivedField::BookingWindow),
            Dimension::HasSpecialRequests => Source::Derived(DerivedField::HasSpecialRequests),
        }
    }

    /// Category label of a record on this dimension.
    pub fn value(self, rec: &BookingRecord) -> Option<&str> {
        match self {
            Dimension::HotelType => Some(rec.hotel_type.as_str()),
            Dimension::MarketSegment => rec.market_segment.as_deref(),
            Dimension::ArrivalMonth => rec.arrival_month.map(|m| m.name()),
            Dimension::BookingWindow => rec.derived.booking_window.map(|w| w.label()),
            Dimension::HasSpecialRequests => rec.derived.has_special_requests.map(|has| {
                if has {
                    HAS_SPECIAL_REQUESTS
                } else {
                    NO_SPECIAL_REQUESTS
                }
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// NumericField – a field usable in means, quantiles and correlations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    IsCanceled,
    LeadTime,
    Adr,
    StaysInWeekendNights,
    StaysInWeekNights,
    Adults,
    Children,
    Babies,
    TotalOfSpecialRequests,
    BookingChanges,
    DaysInWaitingList,
    TotalNights,
    TotalGuests,
}

impl NumericField {
    pub fn as_str(self) -> &'static str {
        match self {
            NumericField::IsCanceled => "is_canceled",
            NumericField::LeadTime => "lead_time",
            NumericField::Adr => "adr",
            NumericField::StaysInWeekendNights => "stays_in_weekend_nights",
            NumericField::StaysInWeekNights => "stays_in_week_nights",
            NumericField::Adults => "adults",
            NumericField::Children => "children",
            NumericField::Babies => "babies",
            NumericField::TotalOfSpecialRequests => "total_of_special_requests",
            NumericField::BookingChanges => "booking_changes",
            NumericField::DaysInWaitingList => "days_in_waiting_list",
            NumericField::TotalNights => "total_nights",
            NumericField::TotalGuests => "total_guests",
        }
    }

    pub fn source(self) -> Source {
        match self {
            NumericField::IsCanceled => Source::Column(Column::IsCanceled),
            NumericField::LeadTime => Source::Column(Column::LeadTime),
            NumericField::Adr => Source::Column(Column::Adr),
            NumericField::StaysInWeekendNights => Source::Column(Column::StaysInWeekendNights),
            NumericField::StaysInWeekNights => Source::Column(Column::StaysInWeekNights),
            NumericField::Adults => Source::Column(Column::Adults),
            NumericField::Children => Source::Column(Column::Children),
            NumericField::Babies => Source::Column(Column::Babies),
            NumericField::TotalOfSpecialRequests => Source::Column(Column::TotalOfSpecialRequests),
            NumericField::BookingChanges => Source::Column(Column::BookingChanges),
            NumericField::DaysInWaitingList => Source::Column(Column::DaysInWaitingList),
            NumericField::TotalNights => Source::Derived(DerivedField::TotalNights),
            NumericField::TotalGuests => Source::Derived(DerivedField::TotalGuests),
        }
    }

    /// Numeric value of a record, `None` when missing.
    pub fn value(self, rec: &BookingRecord) -> Option<f64> {
        match self {
            NumericField::IsCanceled => Some(if rec.is_canceled { 1.0 } else { 0.0 }),
            NumericField::LeadTime => Some(f64::from(rec.lead_time)),
            NumericField::Adr => Some(rec.adr),
            NumericField::StaysInWeekendNights => rec.stays_in_weekend_nights.map(f64::from),
            NumericField::StaysInWeekNights => rec.stays_in_week_nights.map(f64::from),
            NumericField::Adults => rec.adults,
            NumericField::Children => rec.children,
            NumericField::Babies => rec.babies,
            NumericField::TotalOfSpecialRequests => rec.total_of_special_requests.map(f64::from),
            NumericField::BookingChanges => rec.booking_changes.map(f64::from),
            NumericField::DaysInWaitingList => rec.days_in_waiting_list.map(f64::from),
            NumericField::TotalNights => rec.derived.total_nights.map(|n| n as f64),
            NumericField::TotalGuests => rec.derived.total_guests,
        }
    }
}
