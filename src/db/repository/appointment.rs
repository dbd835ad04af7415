use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::patient::{patient_from_row, read_patient_row};
use super::{parse_date, parse_uuid};
use crate::db::DatabaseError;
use crate::models::*;

const APPOINTMENT_SELECT: &str =
    "SELECT a.id, a.patient_id, a.date, a.time, a.duration_minutes, a.reason, a.state, a.notes,
            a.created_at, a.updated_at,
            p.id, p.name, p.phone, p.email, p.notes, p.created_at, p.updated_at
     FROM appointments a
     JOIN patients p ON p.id = a.patient_id";

struct AppointmentRow {
    id: String,
    patient_id: String,
    date: String,
    time: String,
    duration_minutes: u32,
    reason: String,
    state: String,
    notes: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    patient: (
        String,
        String,
        String,
        Option<String>,
        Option<String>,
        NaiveDateTime,
        NaiveDateTime,
    ),
}

fn read_appointment_row(row: &Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        date: row.get(2)?,
        time: row.get(3)?,
        duration_minutes: row.get(4)?,
        reason: row.get(5)?,
        state: row.get(6)?,
        notes: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        patient: read_patient_row(row, 10)?,
    })
}

fn appointment_from_row(raw: AppointmentRow) -> Result<Appointment, DatabaseError> {
    let time = parse_time_of_day(&raw.time).map_err(|e| {
        DatabaseError::ConstraintViolation(format!("invalid time '{}': {e}", raw.time))
    })?;
    Ok(Appointment {
        id: parse_uuid(&raw.id)?,
        patient_id: parse_uuid(&raw.patient_id)?,
        patient: Some(patient_from_row(raw.patient)?),
        date: parse_date(&raw.date)?,
        time,
        duration_minutes: raw.duration_minutes,
        reason: raw.reason,
        state: AppointmentState::from_str(&raw.state)?,
        notes: raw.notes,
        no_show_risk: false,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
    })
}

fn collect_appointments(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, read_appointment_row)?;

    let mut appointments = Vec::new();
    for row in rows {
        appointments.push(appointment_from_row(row?)?);
    }
    Ok(appointments)
}

/// Creates an appointment and returns its id.
/// The referenced patient must exist.
pub fn insert_appointment(conn: &Connection, new: &NewAppointment) -> Result<Uuid, DatabaseError> {
    if !super::patient_exists(conn, &new.patient_id)? {
        return Err(DatabaseError::not_found("Patient", new.patient_id));
    }
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO appointments (id, patient_id, date, time, duration_minutes, reason, state, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id.to_string(),
            new.patient_id.to_string(),
            new.date.to_string(),
            format_time_of_day(new.time),
            new.duration_minutes,
            new.reason,
            new.state.as_str(),
            new.notes,
        ],
    )?;
    Ok(id)
}

/// Fetches one appointment with its patient attached.
pub fn get_appointment(conn: &Connection, id: &Uuid) -> Result<Option<Appointment>, DatabaseError> {
    let sql = format!("{APPOINTMENT_SELECT} WHERE a.id = ?1");
    let raw = conn
        .query_row(&sql, params![id.to_string()], read_appointment_row)
        .optional()?;
    raw.map(appointment_from_row).transpose()
}

/// Appointments for one day, earliest first. Equal times keep insertion order.
pub fn list_appointments_by_date(
    conn: &Connection,
    date: &NaiveDate,
) -> Result<Vec<Appointment>, DatabaseError> {
    let sql = format!("{APPOINTMENT_SELECT} WHERE a.date = ?1 ORDER BY a.time ASC, a.rowid ASC");
    collect_appointments(conn, &sql, params![date.to_string()])
}

/// Patient history, most recent first.
pub fn list_appointments_by_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Appointment>, DatabaseError> {
    let sql = format!(
        "{APPOINTMENT_SELECT} WHERE a.patient_id = ?1 ORDER BY a.date DESC, a.time DESC"
    );
    collect_appointments(conn, &sql, params![patient_id.to_string()])
}

pub fn update_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    if !super::patient_exists(conn, &appt.patient_id)? {
        return Err(DatabaseError::not_found("Patient", appt.patient_id));
    }
    let changed = conn.execute(
        "UPDATE appointments
         SET patient_id = ?1, date = ?2, time = ?3, duration_minutes = ?4, reason = ?5,
             state = ?6, notes = ?7, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?8",
        params![
            appt.patient_id.to_string(),
            appt.date.to_string(),
            format_time_of_day(appt.time),
            appt.duration_minutes,
            appt.reason,
            appt.state.as_str(),
            appt.notes,
            appt.id.to_string(),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Appointment", appt.id));
    }
    Ok(())
}

pub fn delete_appointment(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM appointments WHERE id = ?1",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Appointment", id));
    }
    Ok(())
}

/// Writes the state column. Returns false when no appointment has that id.
pub fn set_appointment_state(
    conn: &Connection,
    id: &Uuid,
    state: AppointmentState,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET state = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
        params![state.as_str(), id.to_string()],
    )?;
    Ok(changed > 0)
}
