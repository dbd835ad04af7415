use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::*;

/// Loads the clinic settings, creating the default record on first access.
pub fn get_clinic_settings(conn: &Connection) -> Result<ClinicSettings, DatabaseError> {
    let existing = conn
        .query_row(
            "SELECT clinic_name, practitioner_name, clinic_phone, address,
                    confirmation_template, reminder_template, delay_template,
                    opening_hours, updated_at
             FROM clinic_settings WHERE id = 1",
            [],
            |row| {
                Ok(ClinicSettings {
                    clinic_name: row.get(0)?,
                    practitioner_name: row.get(1)?,
                    clinic_phone: row.get(2)?,
                    address: row.get(3)?,
                    confirmation_template: row.get(4)?,
                    reminder_template: row.get(5)?,
                    delay_template: row.get(6)?,
                    opening_hours: row.get(7)?,
                    updated_at: row.get::<_, Option<NaiveDateTime>>(8)?,
                })
            },
        )
        .optional()?;

    match existing {
        Some(settings) => Ok(settings),
        None => {
            tracing::info!("Creating default clinic settings");
            let defaults = ClinicSettings::default();
            save_clinic_settings(conn, &defaults)?;
            Ok(defaults)
        }
    }
}

/// Upserts the singleton settings row.
pub fn save_clinic_settings(conn: &Connection, settings: &ClinicSettings) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO clinic_settings (id, clinic_name, practitioner_name, clinic_phone, address,
             confirmation_template, reminder_template, delay_template, opening_hours)
         VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
             clinic_name = excluded.clinic_name,
             practitioner_name = excluded.practitioner_name,
             clinic_phone = excluded.clinic_phone,
             address = excluded.address,
             confirmation_template = excluded.confirmation_template,
             reminder_template = excluded.reminder_template,
             delay_template = excluded.delay_template,
             opening_hours = excluded.opening_hours,
             updated_at = CURRENT_TIMESTAMP",
        params![
            settings.clinic_name,
            settings.practitioner_name,
            settings.clinic_phone,
            settings.address,
            settings.confirmation_template,
            settings.reminder_template,
            settings.delay_template,
            settings.opening_hours,
        ],
    )?;
    Ok(())
}
