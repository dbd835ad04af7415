//! Agenda commands: the day view, state changes, booking and history.

use serde::Deserialize;

use super::{parse_date, parse_id};
use crate::core_state::CoreState;
use crate::models::*;

/// Booking form as sent by the desktop shell.
#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentRequest {
    #[serde(rename = "pacienteId")]
    pub patient_id: String,
    #[serde(rename = "fecha")]
    pub date: String,
    #[serde(rename = "hora")]
    pub time: String,
    #[serde(rename = "duracion")]
    pub duration_minutes: u32,
    #[serde(rename = "motivo", default)]
    pub reason: String,
    #[serde(rename = "estado", default)]
    pub state: Option<String>,
    #[serde(rename = "notas", default)]
    pub notes: Option<String>,
}

impl AppointmentRequest {
    fn into_new_appointment(self) -> Result<NewAppointment, String> {
        let patient_id = parse_id(&self.patient_id)?;
        let date = parse_date(&self.date)?;
        let time = parse_time_of_day(&self.time)
            .map_err(|_| "Invalid time format. Use HH:MM".to_string())?;
        if self.duration_minutes == 0 {
            return Err("Duration must be greater than zero".into());
        }
        let state = match self.state.as_deref().map(str::trim) {
            None | Some("") => AppointmentState::Pending,
            Some(name) => name
                .parse()
                .map_err(|_| format!("Unknown appointment state: {name}"))?,
        };

        Ok(NewAppointment {
            patient_id,
            date,
            time,
            duration_minutes: self.duration_minutes,
            reason: self.reason.trim().to_string(),
            state,
            notes: self.notes.filter(|n| !n.trim().is_empty()),
        })
    }
}

/// Day view for `fecha` (YYYY-MM-DD), delay computed against now.
pub fn get_daily_agenda(state: &CoreState, fecha: &str) -> Result<DailyAgenda, String> {
    let date = parse_date(fecha)?;
    state.daily_agenda(date).map_err(|e| e.to_string())
}

pub fn get_next_appointment(state: &CoreState, fecha: &str) -> Result<Option<Appointment>, String> {
    let date = parse_date(fecha)?;
    state.next_appointment(date).map_err(|e| e.to_string())
}

/// Applies a state by its wire name (`atendido`, `ausente`, ...).
pub fn change_appointment_state(state: &CoreState, id: &str, estado: &str) -> Result<(), String> {
    let id = parse_id(id)?;
    state
        .change_appointment_state(&id, estado)
        .map_err(|e| e.to_string())
}

pub fn get_appointment(state: &CoreState, id: &str) -> Result<Appointment, String> {
    let id = parse_id(id)?;
    state.get_appointment(&id).map_err(|e| e.to_string())
}

pub fn create_appointment(
    state: &CoreState,
    request: AppointmentRequest,
) -> Result<Appointment, String> {
    let new = request.into_new_appointment()?;
    state.create_appointment(&new).map_err(|e| e.to_string())
}

pub fn update_appointment(state: &CoreState, appointment: Appointment) -> Result<(), String> {
    state
        .update_appointment(&appointment)
        .map_err(|e| e.to_string())
}

pub fn delete_appointment(state: &CoreState, id: &str) -> Result<(), String> {
    let id = parse_id(id)?;
    state.delete_appointment(&id).map_err(|e| e.to_string())
}

pub fn get_patient_history(state: &CoreState, patient_id: &str) -> Result<Vec<Appointment>, String> {
    let id = parse_id(patient_id)?;
    state.patient_history(&id).map_err(|e| e.to_string())
}

/// Renders the confirmation, reminder or delay message for an appointment.
pub fn compose_message(state: &CoreState, id: &str, kind: &str) -> Result<String, String> {
    let id = parse_id(id)?;
    let kind: MessageKind = kind
        .trim()
        .parse()
        .map_err(|_| format!("Unknown message kind: {kind}"))?;
    state.compose_message(&id, kind).map_err(|e| e.to_string())
}
