use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only audit entry written when a patient misses an appointment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoShowRecord {
    pub id: Uuid,
    #[serde(rename = "pacienteId")]
    pub patient_id: Uuid,
    #[serde(rename = "turnoId")]
    pub appointment_id: Uuid,
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "createdAt")]
    pub created_at: NaiveDateTime,
}
