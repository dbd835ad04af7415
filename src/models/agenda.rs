use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::appointment::Appointment;

/// Day view built fresh on every query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyAgenda {
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    /// Ordered by time of day ascending.
    #[serde(rename = "turnos")]
    pub appointments: Vec<Appointment>,
    #[serde(rename = "atrasoMinutos")]
    pub delay_minutes: i64,
    #[serde(rename = "totalTurnos")]
    pub total_count: usize,
    #[serde(rename = "turnosPendientes")]
    pub pending_count: usize,
}
