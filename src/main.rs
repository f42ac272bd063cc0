use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result};
use log::{error, info, warn};

use hotel_pulse::config;
use hotel_pulse::dashboard::DashboardReport;
use hotel_pulse::data::cached_dataset;
use hotel_pulse::session::Session;

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let settings = config::load_settings().context("loading settings")?;

    let base = cached_dataset(&settings.data_path, &settings.profile)
        .with_context(|| format!("loading {}", settings.data_path.display()))?;
    info!("Loaded {} bookings", base.len());

    let mut session = Session::new(base, settings.profile.clone());
    for (dim, values) in settings.initial_filters() {
        session.set_selection(dim, values);
    }

    let report = session.report().context("computing dashboard")?;
    if report == DashboardReport::NoData {
        warn!("No data for current selection");
    }

    let mut stdout = std::io::stdout().lock();
    if settings.pretty {
        serde_json::to_writer_pretty(&mut stdout, &report)?;
    } else {
        serde_json::to_writer(&mut stdout, &report)?;
    }
    writeln!(stdout)?;
    Ok(())
}
