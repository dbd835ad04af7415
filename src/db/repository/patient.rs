use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::parse_uuid;
use crate::db::DatabaseError;
use crate::models::*;

/// Maximum rows returned by `search_patients`.
pub const PATIENT_SEARCH_LIMIT: usize = 20;

type PatientRow = (
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    NaiveDateTime,
    NaiveDateTime,
);

/// Read the seven patient columns starting at `offset`.
pub(crate) fn read_patient_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<PatientRow> {
    Ok((
        row.get(offset)?,
        row.get(offset + 1)?,
        row.get(offset + 2)?,
        row.get(offset + 3)?,
        row.get(offset + 4)?,
        row.get(offset + 5)?,
        row.get(offset + 6)?,
    ))
}

pub(crate) fn patient_from_row(raw: PatientRow) -> Result<Patient, DatabaseError> {
    let (id, name, phone, email, notes, created_at, updated_at) = raw;
    Ok(Patient {
        id: parse_uuid(&id)?,
        name,
        phone,
        email,
        notes,
        created_at,
        updated_at,
    })
}

/// Inserts a patient and returns the stored record (with timestamps).
pub fn insert_patient(conn: &Connection, new: &NewPatient) -> Result<Patient, DatabaseError> {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO patients (id, name, phone, email, notes)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id.to_string(), new.name.trim(), new.phone.trim(), new.email, new.notes],
    )?;
    get_patient(conn, &id)?.ok_or_else(|| DatabaseError::not_found("Patient", id))
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let raw = conn
        .query_row(
            "SELECT id, name, phone, email, notes, created_at, updated_at
             FROM patients WHERE id = ?1",
            params![id.to_string()],
            |row| read_patient_row(row, 0),
        )
        .optional()?;
    raw.map(patient_from_row).transpose()
}

pub fn patient_exists(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM patients WHERE id = ?1",
        params![id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn update_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE patients
         SET name = ?1, phone = ?2, email = ?3, notes = ?4, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?5",
        params![
            patient.name.trim(),
            patient.phone.trim(),
            patient.email,
            patient.notes,
            patient.id.to_string(),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Patient", patient.id));
    }
    Ok(())
}

/// Deletes a patient. Appointments and no-show history cascade.
pub fn delete_patient(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM patients WHERE id = ?1", params![id.to_string()])?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Patient", id));
    }
    Ok(())
}

/// All patients ordered by name.
pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, phone, email, notes, created_at, updated_at
         FROM patients ORDER BY name COLLATE NOCASE",
    )?;
    let rows = stmt.query_map([], |row| read_patient_row(row, 0))?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row?)?);
    }
    Ok(patients)
}

/// Case-insensitive substring search over name or phone.
pub fn search_patients(conn: &Connection, term: &str) -> Result<Vec<Patient>, DatabaseError> {
    let pattern = format!("%{}%", escape_like(term.trim()));
    let mut stmt = conn.prepare(
        "SELECT id, name, phone, email, notes, created_at, updated_at
         FROM patients
         WHERE name LIKE ?1 ESCAPE '\\' OR phone LIKE ?1 ESCAPE '\\'
         ORDER BY name COLLATE NOCASE
         LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![pattern, PATIENT_SEARCH_LIMIT as i64], |row| {
        read_patient_row(row, 0)
    })?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row?)?);
    }
    Ok(patients)
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
