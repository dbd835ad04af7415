//! Presentation boundary. Each command takes string-shaped input from the
//! desktop shell, calls into `CoreState` and flattens errors to `String`.

pub mod agenda;
pub mod license;
pub mod patients;
pub mod settings;

use chrono::NaiveDate;
use uuid::Uuid;

/// Boundary date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Verifies the backend is running
pub fn health_check() -> String {
    tracing::debug!("Health check called");
    "ok".to_string()
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| "Invalid date format. Use YYYY-MM-DD".to_string())
}

pub(crate) fn parse_id(s: &str) -> Result<Uuid, String> {
    Uuid::parse_str(s.trim()).map_err(|_| format!("Invalid id: {s}"))
}
