use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::AppointmentState;
use super::patient::Patient;

/// Wire and storage format for a time of day.
pub const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    #[serde(rename = "pacienteId")]
    pub patient_id: Uuid,
    #[serde(rename = "paciente", default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<Patient>,
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "hora", with = "hhmm")]
    pub time: NaiveTime,
    #[serde(rename = "duracion")]
    pub duration_minutes: u32,
    #[serde(rename = "motivo")]
    pub reason: String,
    #[serde(rename = "estado")]
    pub state: AppointmentState,
    #[serde(rename = "notas", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Derived per query from no-show history, never stored.
    #[serde(rename = "riesgoNoShow", default)]
    pub no_show_risk: bool,
    #[serde(rename = "createdAt")]
    pub created_at: NaiveDateTime,
    #[serde(rename = "updatedAt")]
    pub updated_at: NaiveDateTime,
}

impl Appointment {
    pub fn minute_of_day(&self) -> i64 {
        minute_of_day(self.time)
    }
}

/// Fields supplied when booking an appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    #[serde(rename = "pacienteId")]
    pub patient_id: Uuid,
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "hora", with = "hhmm")]
    pub time: NaiveTime,
    #[serde(rename = "duracion")]
    pub duration_minutes: u32,
    #[serde(rename = "motivo")]
    pub reason: String,
    #[serde(rename = "estado", default = "default_state")]
    pub state: AppointmentState,
    #[serde(rename = "notas", default)]
    pub notes: Option<String>,
}

fn default_state() -> AppointmentState {
    AppointmentState::Pending
}

/// Minutes since midnight.
pub fn minute_of_day(time: NaiveTime) -> i64 {
    i64::from(time.hour()) * 60 + i64::from(time.minute())
}

/// Parse `HH:MM` (24-hour). A single-digit hour is accepted.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(s.trim(), TIME_FORMAT)
}

pub fn format_time_of_day(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_time_of_day(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_time_of_day(&s).map_err(de::Error::custom)
    }
}
