//! Repository layer — entity-scoped database operations.
//!
//! Free functions over a borrowed `Connection`, one sub-module per table.
//! `SqliteStore` wraps these behind the store ports.

mod appointment;
mod clinic;
mod license;
mod no_show;
mod patient;

use chrono::NaiveDate;
use uuid::Uuid;

use super::DatabaseError;

pub use appointment::*;
pub use clinic::*;
pub use license::*;
pub use no_show::*;
pub use patient::*;

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DatabaseError::ConstraintViolation(format!("invalid date '{s}': {e}")))
}
