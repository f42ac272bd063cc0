//! End-to-end: file on disk → derived store → filtered session → report.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use hotel_pulse::dashboard::{AdrPolicy, DashboardProfile, DashboardReport};
use hotel_pulse::data::fields::{DerivedField, Dimension, NumericField};
use hotel_pulse::data::model::BookingWindow;
use hotel_pulse::data::{cached_dataset, load_dataset};
use hotel_pulse::error::LoadError;
use hotel_pulse::session::Session;

const HEADER: &str = "hotel,is_canceled,lead_time,arrival_date_month,stays_in_weekend_nights,\
stays_in_week_nights,adults,children,babies,market_segment,booking_changes,\
days_in_waiting_list,adr,total_of_special_requests";

/// 100 bookings, 40 canceled, spread over both hotels and four segments.
fn hundred_bookings() -> String {
    let segments = ["Online TA", "Direct", "Groups", "Corporate"];
    let months = ["January", "May", "July", "December"];
    let mut csv = format!("{HEADER}\n");
    for i in 0..100u32 {
        let hotel = if i % 2 == 0 { "City Hotel" } else { "Resort Hotel" };
        let canceled = u8::from(i < 40);
        let lead = i * 3;
        let children = if i % 10 == 0 { "NA".to_string() } else { (i % 2).to_string() };
        csv.push_str(&format!(
            "{hotel},{canceled},{lead},{},{},{},2,{children},0,{},{},0,{},{}\n",
            months[(i % 4) as usize],
            i % 3,
            1 + i % 4,
            segments[(i % 4) as usize],
            i % 2,
            80.0 + f64::from(i),
            i % 3,
        ));
    }
    csv
}

fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

fn session_for(contents: &str, profile: DashboardProfile) -> Session {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "hotel_bookings.csv", contents);
    let store = load_dataset(&path, &profile).unwrap();
    Session::new(Arc::new(store), profile)
}

#[test]
fn derived_fields_on_loaded_csv() {
    let session = session_for(&hundred_bookings(), DashboardProfile::default());
    let store = session.base();

    assert_eq!(store.len(), 100);
    assert_eq!(store.derived.len(), 4);
    for rec in &store.records {
        let nights = u64::from(rec.stays_in_weekend_nights.unwrap())
            + u64::from(rec.stays_in_week_nights.unwrap());
        assert_eq!(rec.derived.total_nights, Some(nights));
        assert_eq!(
            rec.derived.booking_window,
            Some(BookingWindow::from_lead_time(rec.lead_time))
        );
    }
    // Row 0 has children = NA and still counts two guests.
    assert_eq!(store.records[0].children, None);
    assert_eq!(store.records[0].derived.total_guests, Some(2.0));
}

#[test]
fn forty_percent_cancellation_end_to_end() {
    let session = session_for(&hundred_bookings(), DashboardProfile::default());
    let report = session.report().unwrap();
    let views = report.views().unwrap();

    assert_eq!(views.kpis.total_bookings, 100);
    assert_eq!(views.kpis.cancellation_rate, 40.0);
    assert_eq!(views.by_booking_window.len(), 4);
    assert_eq!(views.by_month.as_ref().unwrap().len(), 12);
    assert_eq!(views.by_special_requests.as_ref().unwrap().len(), 2);
    assert!(views.by_market_segment.is_some());
    assert!(views.correlation.is_some());
    assert_eq!(views.scatter.len(), 100);
}

#[test]
fn singleton_hotel_filter_matches_manual_rate() {
    let mut session = session_for(&hundred_bookings(), DashboardProfile::default());
    session.set_selection(Dimension::HotelType, ["Resort Hotel".to_string()]);

    let view = session.view();
    assert!(view.iter().all(|r| r.hotel_type == "Resort Hotel"));
    let canceled = view.iter().filter(|r| r.is_canceled).count();
    let expected = canceled as f64 * 100.0 / view.len() as f64;

    let report = session.report().unwrap();
    assert_eq!(report.views().unwrap().kpis.cancellation_rate, expected);
}

#[test]
fn full_universe_filter_is_identity() {
    let mut session = session_for(&hundred_bookings(), DashboardProfile::default());
    for dim in [Dimension::HotelType, Dimension::MarketSegment] {
        session.select_all(dim);
    }
    let view = session.view();
    assert_eq!(view.len(), session.base().len());
    assert!(view.iter().zip(&session.base().records).all(|(a, b)| a == b));
}

#[test]
fn empty_selection_is_no_data() {
    let mut session = session_for(&hundred_bookings(), DashboardProfile::default());
    session.set_selection(Dimension::HotelType, ["City Hotel".to_string()]);
    session.set_selection(Dimension::MarketSegment, ["Direct".to_string()]);
    // City rows are even, Direct rows are i % 4 == 1: nothing matches both.
    assert_eq!(session.visible_count(), 0);
    assert_eq!(session.report().unwrap(), DashboardReport::NoData);
}

#[test]
fn optional_columns_missing() {
    let csv = "hotel,is_canceled,lead_time,adr\n\
               City Hotel,1,200,100\n\
               City Hotel,0,10,50\n\
               Resort Hotel,0,45,0\n";
    let session = session_for(csv, DashboardProfile::default());
    let store = session.base();
    assert_eq!(store.derived, BTreeSet::from([DerivedField::BookingWindow]));

    let report = session.report().unwrap();
    let views = report.views().unwrap();
    assert!(views.by_market_segment.is_none());
    assert!(views.by_month.is_none());
    assert!(views.by_special_requests.is_none());
    assert_eq!(views.risk.no_requests_vs_requests, None);
    // adr = 0 is left out of the average under the default policy.
    assert_eq!(views.kpis.mean_adr, Some(75.0));
    // is_canceled, lead_time and adr remain.
    assert_eq!(views.correlation.as_ref().unwrap().fields.len(), 3);
}

#[test]
fn empty_party_policy() {
    let csv = format!(
        "{HEADER}\n\
         City Hotel,0,5,May,1,2,2,0,0,Direct,0,0,90,1\n\
         City Hotel,1,5,May,1,2,0,0,0,Direct,0,0,90,0\n"
    );

    let keep = session_for(&csv, DashboardProfile::default());
    assert_eq!(keep.base().len(), 2);

    let profile = DashboardProfile {
        drop_empty_parties: true,
        adr_policy: AdrPolicy::All,
        ..DashboardProfile::default()
    };
    let dropped = session_for(&csv, profile);
    assert_eq!(dropped.base().len(), 1);
}

#[test]
fn parquet_input_matches_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bookings.parquet");

    let columns: Vec<(&str, ArrayRef)> = vec![
        ("hotel", Arc::new(StringArray::from(vec!["City Hotel", "Resort Hotel", "City Hotel"]))),
        ("is_canceled", Arc::new(Int64Array::from(vec![1, 0, 0]))),
        ("lead_time", Arc::new(Int64Array::from(vec![100, 20, 300]))),
        ("adr", Arc::new(Float64Array::from(vec![110.0, 75.5, 0.0]))),
        ("adults", Arc::new(Int64Array::from(vec![2, 1, 2]))),
        ("children", Arc::new(Float64Array::from(vec![Some(1.0), None, Some(0.0)]))),
    ];
    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, col)| Field::new(*name, col.data_type().clone(), true))
            .collect::<Vec<_>>(),
    ));
    let batch =
        RecordBatch::try_new(schema.clone(), columns.into_iter().map(|(_, c)| c).collect())
            .unwrap();
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let store = load_dataset(&path, &DashboardProfile::default()).unwrap();
    assert_eq!(store.len(), 3);
    let guests: Vec<_> = store.records.iter().map(|r| r.derived.total_guests).collect();
    assert_eq!(guests, vec![Some(3.0), Some(1.0), Some(2.0)]);
    assert!(store.provides(NumericField::TotalGuests.source()));
}

#[test]
fn load_failures_are_descriptive() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.csv");
    let err = load_dataset(&missing, &DashboardProfile::default()).unwrap_err();
    assert!(matches!(err, LoadError::NotFound(_)));
    assert!(err.to_string().contains("nope.csv"));

    let path = write_fixture(dir.path(), "bad.csv", "hotel,lead_time,adr\nCity Hotel,3,50\n");
    let err = load_dataset(&path, &DashboardProfile::default()).unwrap_err();
    assert_eq!(err.to_string(), "required column 'is_canceled' is missing");
}

#[test]
fn base_dataset_is_loaded_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "hotel_bookings.csv", &hundred_bookings());
    let profile = DashboardProfile::default();

    let first = cached_dataset(&path, &profile).unwrap();
    std::fs::remove_file(&path).unwrap();
    let second = cached_dataset(&path, &profile).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}
