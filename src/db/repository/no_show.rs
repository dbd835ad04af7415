use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{parse_date, parse_uuid};
use crate::db::DatabaseError;
use crate::models::*;

/// Appends a no-show entry. History is never updated in place.
pub fn insert_no_show(
    conn: &Connection,
    patient_id: &Uuid,
    appointment_id: &Uuid,
    date: &NaiveDate,
) -> Result<Uuid, DatabaseError> {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO no_show_history (id, patient_id, appointment_id, date)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            id.to_string(),
            patient_id.to_string(),
            appointment_id.to_string(),
            date.to_string(),
        ],
    )?;
    Ok(id)
}

/// True when the patient has at least one no-show dated on or after `since`.
pub fn has_no_show_since(
    conn: &Connection,
    patient_id: &Uuid,
    since: &NaiveDate,
) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM no_show_history WHERE patient_id = ?1 AND date >= ?2",
        params![patient_id.to_string(), since.to_string()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Full history for a patient, most recent first.
pub fn list_no_shows_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<NoShowRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, appointment_id, date, created_at
         FROM no_show_history WHERE patient_id = ?1
         ORDER BY date DESC, created_at DESC",
    )?;

    let rows = stmt.query_map(params![patient_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, NaiveDateTime>(4)?,
        ))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (id, patient_id, appointment_id, date, created_at) = row?;
        records.push(NoShowRecord {
            id: parse_uuid(&id)?,
            patient_id: parse_uuid(&patient_id)?,
            appointment_id: parse_uuid(&appointment_id)?,
            date: parse_date(&date)?,
            created_at,
        });
    }
    Ok(records)
}
