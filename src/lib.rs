//! Hotel booking cancellation analytics.
//!
//! Loads a booking dataset once, derives a few categorical features, and
//! computes the tables a cancellation dashboard draws: KPIs, cancellation
//! rates per category, correlations, distributions and a scatter sample.
//! Rendering is left to whoever consumes [`dashboard::DashboardReport`].

pub mod analysis;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod session;
