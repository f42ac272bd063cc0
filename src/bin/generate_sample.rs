use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const HEADERS: [&str; 14] = [
    "hotel",
    "is_canceled",
    "lead_time",
    "arrival_date_month",
    "stays_in_weekend_nights",
    "stays_in_week_nights",
    "adults",
    "children",
    "babies",
    "market_segment",
    "booking_changes",
    "days_in_waiting_list",
    "adr",
    "total_of_special_requests",
];

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// (segment, weight, base cancellation probability)
const SEGMENTS: [(&str, u32, f64); 5] = [
    ("Online TA", 47, 0.37),
    ("Offline TA/TO", 20, 0.34),
    ("Groups", 17, 0.61),
    ("Direct", 11, 0.15),
    ("Corporate", 5, 0.19),
];

struct Booking {
    hotel: &'static str,
    is_canceled: bool,
    lead_time: u32,
    month: &'static str,
    weekend_nights: u32,
    week_nights: u32,
    adults: u32,
    children: Option<u32>,
    babies: u32,
    segment: &'static str,
    booking_changes: u32,
    days_in_waiting_list: u32,
    adr: f64,
    special_requests: u32,
}

fn generate(n: usize, rng: &mut StdRng) -> Result<Vec<Booking>> {
    let segment_dist = WeightedIndex::new(SEGMENTS.iter().map(|(_, w, _)| *w))?;

    let bookings = (0..n)
        .map(|_| {
            let (segment, _, segment_risk) = SEGMENTS[segment_dist.sample(rng)];
            let hotel = if rng.gen_bool(0.66) { "City Hotel" } else { "Resort Hotel" };
            let month_idx = rng.gen_range(0..12);
            let summer = (4..8).contains(&month_idx);

            // Roughly exponential, capped at the longest lead time in the public data.
            let lead_time = ((-(1.0 - rng.gen::<f64>()).ln()) * 100.0).min(737.0) as u32;
            let special_requests = if rng.gen_bool(0.45) { rng.gen_range(1..=3) } else { 0 };

            let mut p_cancel = segment_risk + f64::from(lead_time.min(365)) / 1000.0;
            if special_requests > 0 {
                p_cancel *= 0.45;
            }
            if summer {
                p_cancel += 0.05;
            }
            if hotel == "Resort Hotel" {
                p_cancel -= 0.08;
            }

            let adults = if rng.gen_bool(0.01) { 0 } else { rng.gen_range(1..=3) };
            let base_rate: f64 = if hotel == "City Hotel" { 105.0 } else { 95.0 };
            let season: f64 = if summer { 1.35 } else { 0.9 };
            let adr = if rng.gen_bool(0.015) {
                0.0
            } else {
                base_rate * season + rng.gen_range(-40.0..60.0)
            };

            Booking {
                hotel,
                is_canceled: rng.gen_bool(p_cancel.clamp(0.02, 0.95)),
                lead_time,
                month: MONTHS[month_idx],
                weekend_nights: rng.gen_range(0..=2),
                week_nights: rng.gen_range(0..=5),
                adults,
                children: (!rng.gen_bool(0.002)).then(|| u32::from(rng.gen_bool(0.08))),
                babies: u32::from(rng.gen_bool(0.01)),
                segment,
                booking_changes: if rng.gen_bool(0.15) { rng.gen_range(1..=4) } else { 0 },
                days_in_waiting_list: if rng.gen_bool(0.03) { rng.gen_range(1..=120) } else { 0 },
                adr: (adr * 100.0).round() / 100.0,
                special_requests,
            }
        })
        .collect();
    Ok(bookings)
}

fn write_csv(path: &Path, bookings: &[Booking]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    writer.write_record(HEADERS)?;
    for b in bookings {
        writer.write_record([
            b.hotel.to_string(),
            u8::from(b.is_canceled).to_string(),
            b.lead_time.to_string(),
            b.month.to_string(),
            b.weekend_nights.to_string(),
            b.week_nights.to_string(),
            b.adults.to_string(),
            b.children.map_or_else(|| "NA".to_string(), |c| c.to_string()),
            b.babies.to_string(),
            b.segment.to_string(),
            b.booking_changes.to_string(),
            b.days_in_waiting_list.to_string(),
            b.adr.to_string(),
            b.special_requests.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, bookings: &[Booking]) -> Result<()> {
    let text = |f: fn(&Booking) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(bookings.iter().map(f).collect::<Vec<_>>()))
    };
    let int = |f: fn(&Booking) -> u32| -> ArrayRef {
        Arc::new(Int64Array::from(
            bookings.iter().map(|b| i64::from(f(b))).collect::<Vec<_>>(),
        ))
    };

    let columns: Vec<ArrayRef> = vec![
        text(|b| b.hotel),
        int(|b| u32::from(b.is_canceled)),
        int(|b| b.lead_time),
        text(|b| b.month),
        int(|b| b.weekend_nights),
        int(|b| b.week_nights),
        int(|b| b.adults),
        Arc::new(Float64Array::from(
            bookings
                .iter()
                .map(|b| b.children.map(f64::from))
                .collect::<Vec<_>>(),
        )),
        int(|b| b.babies),
        text(|b| b.segment),
        int(|b| b.booking_changes),
        int(|b| b.days_in_waiting_list),
        Arc::new(Float64Array::from(
            bookings.iter().map(|b| b.adr).collect::<Vec<_>>(),
        )),
        int(|b| b.special_requests),
    ];

    let fields: Vec<Field> = HEADERS
        .iter()
        .zip(&columns)
        .map(|(name, col)| Field::new(*name, col.data_type().clone(), *name == "children"))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/hotel_bookings.csv".to_string());
    let path = Path::new(&output);
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let mut rng = StdRng::seed_from_u64(42);
    let bookings = generate(20_000, &mut rng)?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("parquet") | Some("pq") => write_parquet(path, &bookings)?,
        _ => write_csv(path, &bookings)?,
    }

    log::info!("Wrote {} bookings to {output}", bookings.len());
    println!("Wrote {} bookings to {output}", bookings.len());
    Ok(())
}
