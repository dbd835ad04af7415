use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::*;

pub fn get_license(conn: &Connection) -> Result<Option<LicenseRecord>, DatabaseError> {
    let record = conn
        .query_row(
            "SELECT license_key, activated_at, expires_at, active, version
             FROM licenses WHERE id = 1",
            [],
            |row| {
                Ok(LicenseRecord {
                    key: row.get(0)?,
                    activated_at: row.get(1)?,
                    expires_at: row.get(2)?,
                    active: row.get::<_, i32>(3)? != 0,
                    version: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(record)
}

/// Replaces the current license, if any.
pub fn save_license(conn: &Connection, license: &LicenseRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO licenses (id, license_key, activated_at, expires_at, active, version)
         VALUES (1, ?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
             license_key = excluded.license_key,
             activated_at = excluded.activated_at,
             expires_at = excluded.expires_at,
             active = excluded.active,
             version = excluded.version",
        params![
            license.key,
            license.activated_at,
            license.expires_at,
            license.active as i32,
            license.version,
        ],
    )?;
    Ok(())
}
