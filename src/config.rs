use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;
use thiserror::Error;

use crate::dashboard::DashboardProfile;
use crate::data::fields::Dimension;
use crate::data::filter::FilterState;

/// Names a JSON settings file to use instead of the default one.
pub const CONFIG_ENV: &str = "HOTEL_PULSE_CONFIG";
/// Overrides `data_path`.
pub const DATA_ENV: &str = "HOTEL_PULSE_DATA";
/// Read from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "hotel-pulse.json";
pub const DEFAULT_DATA_PATH: &str = "data/hotel_bookings.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading settings {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing settings {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Startup settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_path: PathBuf,
    pub profile: DashboardProfile,
    /// Initial hotel selection; empty selects all.
    pub hotel_types: Vec<String>,
    /// Initial market segment selection; empty selects all.
    pub market_segments: Vec<String>,
    /// Pretty-print the JSON report.
    pub pretty: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            profile: DashboardProfile::default(),
            hotel_types: Vec::new(),
            market_segments: Vec::new(),
            pretty: true,
        }
    }
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Initial filters; dimensions left empty are not filtered.
    pub fn initial_filters(&self) -> FilterState {
        [
            (Dimension::HotelType, &self.hotel_types),
            (Dimension::MarketSegment, &self.market_segments),
        ]
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(dim, values)| (dim, values.iter().cloned().collect()))
        .collect()
    }
}

/// Settings from the process environment, see [`resolve`].
pub fn load_settings() -> Result<Settings, ConfigError> {
    resolve(std::env::var_os(CONFIG_ENV), std::env::var_os(DATA_ENV))
}

/// Pick the settings file (explicit, then default, then built-in defaults)
/// and apply the data path override.
pub fn resolve(
    config_file: Option<OsString>,
    data_override: Option<OsString>,
) -> Result<Settings, ConfigError> {
    let mut settings = match config_file {
        Some(path) => Settings::from_file(Path::new(&path))?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            Settings::from_file(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => Settings::default(),
    };

    if let Some(path) = data_override {
        settings.data_path = PathBuf::from(path);
    }

    info!("Using data file {}", settings.data_path.display());
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::dashboard::AdrPolicy;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"hotel_types": ["City Hotel"], "profile": {{"adr_policy": "all"}}}}"#
        )
        .unwrap();

        let settings = resolve(Some(file.path().into()), None).unwrap();
        assert_eq!(settings.data_path, PathBuf::from(DEFAULT_DATA_PATH));
        assert_eq!(settings.profile.adr_policy, AdrPolicy::All);
        assert_eq!(settings.profile.sample_cap, 5000);

        let filters = settings.initial_filters();
        assert_eq!(filters.len(), 1);
        assert!(filters[&Dimension::HotelType].contains("City Hotel"));
    }

    #[test]
    fn data_override_wins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"data_path": "a.csv"}}"#).unwrap();

        let settings = resolve(Some(file.path().into()), Some("b.parquet".into())).unwrap();
        assert_eq!(settings.data_path, PathBuf::from("b.parquet"));
    }

    #[test]
    fn bad_files_are_errors() {
        let err = resolve(Some("no/such/settings.json".into()), None).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = resolve(Some(file.path().into()), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
