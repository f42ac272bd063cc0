/// Data layer: core types, loading, derivation and filtering.
///
/// Architecture:
/// ```text
///  .csv / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → BookingStore (null rows dropped)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  derive   │  total_nights, total_guests, booking_window, has_special_requests
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ BookingStore  │  Vec<BookingRecord>, schema, category index (immutable from here)
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  categorical predicates → BookingView
///   └──────────┘
/// ```
pub mod derive;
pub mod fields;
pub mod filter;
pub mod loader;
pub mod model;

use std::path::Path;
use std::sync::Arc;

use log::info;
use once_cell::sync::OnceCell;

use crate::dashboard::DashboardProfile;
use crate::error::{LoadError, LoadResult};
use model::BookingStore;

/// Load a file and run the one-time derivation pass.
pub fn load_dataset(path: &Path, profile: &DashboardProfile) -> LoadResult<BookingStore> {
    let mut store = loader::load_file(path)?;
    derive::derive_features(&mut store);

    if profile.drop_empty_parties {
        let dropped = derive::drop_empty_parties(&mut store);
        if store.is_empty() {
            return Err(LoadError::Empty { dropped });
        }
    }

    Ok(store)
}

static BASE_DATASET: OnceCell<Arc<BookingStore>> = OnceCell::new();

/// Process-wide memoized [`load_dataset`].
///
/// The first successful call loads the file; later calls return the same
/// store without touching the disk, whatever arguments they pass. A failed
/// load is not cached.
pub fn cached_dataset(path: &Path, profile: &DashboardProfile) -> LoadResult<Arc<BookingStore>> {
    BASE_DATASET
        .get_or_try_init(|| {
            info!("Loading base dataset from {}", path.display());
            load_dataset(path, profile).map(Arc::new)
        })
        .cloned()
}
