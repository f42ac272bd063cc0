use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::fields::{Column, DerivedField, Dimension, Source};

// ---------------------------------------------------------------------------
// CellValue – a single raw cell as read from the input file
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes a Pandas export produces.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// `NaN` floats count as null, the way Pandas writes missing numbers.
    pub fn is_null(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the cell. Text is parsed, bools map to 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if !v.is_nan() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| !v.is_nan()),
            _ => None,
        }
    }
}

/// One input row keyed by recognised column. Unknown headers are not kept.
pub type RawRow = BTreeMap<Column, CellValue>;

// ---------------------------------------------------------------------------
// Month
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    /// Calendar order.
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }
}

impl FromStr for Month {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Month::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("'{s}' is not a month name"))
    }
}

// ---------------------------------------------------------------------------
// BookingWindow – coarse lead-time bucket
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BookingWindow {
    LastMinute,
    OneToThreeMonths,
    ThreeToSixMonths,
    WayAhead,
}

impl BookingWindow {
    /// Ascending lead-time order.
    pub const ALL: [BookingWindow; 4] = [
        BookingWindow::LastMinute,
        BookingWindow::OneToThreeMonths,
        BookingWindow::ThreeToSixMonths,
        BookingWindow::WayAhead,
    ];

    /// Upper edges are inclusive: 30 is still last minute, 31 is not.
    pub fn from_lead_time(days: u32) -> Self {
        match days {
            0..=30 => BookingWindow::LastMinute,
            31..=90 => BookingWindow::OneToThreeMonths,
            91..=180 => BookingWindow::ThreeToSixMonths,
            _ => BookingWindow::WayAhead,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BookingWindow::LastMinute => "Last minute",
            BookingWindow::OneToThreeMonths => "1-3 months",
            BookingWindow::ThreeToSixMonths => "3-6 months",
            BookingWindow::WayAhead => "Way ahead",
        }
    }
}

impl fmt::Display for BookingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// BookingRecord – one row of the dataset
// ---------------------------------------------------------------------------

/// Fields computed by the feature deriver. `None` until derivation ran, or
/// permanently when a prerequisite column is missing from the dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedFields {
    pub total_nights: Option<u64>,
    pub total_guests: Option<f64>,
    pub booking_window: Option<BookingWindow>,
    pub has_special_requests: Option<bool>,
}

/// A single booking. Required columns are plain values; every optional
/// column is an `Option` that is `None` both for a null cell and for a
/// column the file never had (the store's schema tells the two apart).
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRecord {
    pub hotel_type: String,
    pub is_canceled: bool,
    pub lead_time: u32,
    pub adr: f64,
    pub arrival_month: Option<Month>,
    pub market_segment: Option<String>,
    pub stays_in_weekend_nights: Option<u32>,
    pub stays_in_week_nights: Option<u32>,
    pub adults: Option<f64>,
    pub children: Option<f64>,
    pub babies: Option<f64>,
    pub total_of_special_requests: Option<u32>,
    pub booking_changes: Option<u32>,
    pub days_in_waiting_list: Option<u32>,
    pub derived: DerivedFields,
}

impl BookingRecord {
    /// A record with only the required columns set.
    pub fn new(hotel_type: impl Into<String>, is_canceled: bool, lead_time: u32, adr: f64) -> Self {
        BookingRecord {
            hotel_type: hotel_type.into(),
            is_canceled,
            lead_time,
            adr,
            arrival_month: None,
            market_segment: None,
            stays_in_weekend_nights: None,
            stays_in_week_nights: None,
            adults: None,
            children: None,
            babies: None,
            total_of_special_requests: None,
            booking_changes: None,
            days_in_waiting_list: None,
            derived: DerivedFields::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// BookingStore – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset with its schema and per-dimension category index.
#[derive(Debug, Clone)]
pub struct BookingStore {
    /// All bookings (rows).
    pub records: Vec<BookingRecord>,
    /// Source columns present in the input file.
    pub schema: BTreeSet<Column>,
    /// Derived columns the deriver was able to compute.
    pub derived: BTreeSet<DerivedField>,
    /// For each available dimension the sorted set of observed labels.
    pub unique_values: BTreeMap<Dimension, BTreeSet<String>>,
}

impl BookingStore {
    /// Build the store and its category index from loaded records.
    pub fn from_records(records: Vec<BookingRecord>, schema: BTreeSet<Column>) -> Self {
        let mut store = BookingStore {
            records,
            schema,
            derived: BTreeSet::new(),
            unique_values: BTreeMap::new(),
        };
        store.rebuild_index();
        store
    }

    /// Recompute `unique_values` after the record set or derived columns change.
    pub fn rebuild_index(&mut self) {
        let mut unique_values: BTreeMap<Dimension, BTreeSet<String>> = BTreeMap::new();
        for dim in Dimension::ALL {
            if !self.provides(dim.source()) {
                continue;
            }
            let labels = self
                .records
                .iter()
                .filter_map(|rec| dim.value(rec))
                .map(str::to_string)
                .collect();
            unique_values.insert(dim, labels);
        }
        self.unique_values = unique_values;
    }

    /// Whether a source or derived column is available in this store.
    pub fn provides(&self, source: Source) -> bool {
        match source {
            Source::Column(col) => self.schema.contains(&col),
            Source::Derived(field) => self.derived.contains(&field),
        }
    }

    /// Keep only records matching `keep`, then refresh the category index.
    pub fn retain(&mut self, keep: impl FnMut(&BookingRecord) -> bool) {
        self.records.retain(keep);
        self.rebuild_index();
    }

    /// Number of bookings.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no bookings.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
