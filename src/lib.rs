//! Household energy balance service.
//!
//! Reports consumption, generation, surplus and deficit over a date range.
//! Past periods are summed from stored readings; periods after "now" are
//! filled from per-location solar forecast artifacts.

pub mod api;
pub mod config;
pub mod domain;
pub mod forecast;
pub mod ml;
pub mod repo;
pub mod report;
pub mod state;
pub mod telemetry;

pub use report::{ReportEngine, ReportError, ReportRequest};
pub use state::AppState;
