//! Storage ports consumed by the agenda and license engines, and the
//! SQLite-backed implementation that owns the single connection.
//!
//! The connection is threaded explicitly through `SqliteStore`; there is no
//! process-wide handle. Write serialization is delegated to the mutex and
//! SQLite itself.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Months, NaiveDate};
use rusqlite::Connection;
use uuid::Uuid;

use super::{repository, sqlite, DatabaseError};
use crate::clock::{SystemTimeSource, TimeSource};
use crate::models::*;

/// Appointment persistence as seen by the agenda engine.
pub trait AppointmentStore: Send + Sync {
    fn list_appointments_by_date(&self, date: NaiveDate) -> Result<Vec<Appointment>, DatabaseError>;

    fn list_appointments_by_patient(&self, patient_id: &Uuid) -> Result<Vec<Appointment>, DatabaseError>;

    fn get_appointment(&self, id: &Uuid) -> Result<Option<Appointment>, DatabaseError>;

    fn create_appointment(&self, new: &NewAppointment) -> Result<Uuid, DatabaseError>;

    fn update_appointment(&self, appt: &Appointment) -> Result<(), DatabaseError>;

    fn delete_appointment(&self, id: &Uuid) -> Result<(), DatabaseError>;

    /// Returns false when no appointment has that id.
    fn set_appointment_state(&self, id: &Uuid, state: AppointmentState) -> Result<bool, DatabaseError>;

    /// At least one no-show within the trailing `window_months` calendar months.
    fn has_recent_no_show(&self, patient_id: &Uuid, window_months: u32) -> Result<bool, DatabaseError>;

    fn record_no_show(
        &self,
        patient_id: &Uuid,
        appointment_id: &Uuid,
        date: NaiveDate,
    ) -> Result<(), DatabaseError>;
}

/// Singleton license persistence.
pub trait LicenseStore: Send + Sync {
    fn get_license(&self) -> Result<Option<LicenseRecord>, DatabaseError>;

    fn save_license(&self, license: &LicenseRecord) -> Result<(), DatabaseError>;
}

/// SQLite-backed store for every entity in the ledger.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    clock: Arc<dyn TimeSource>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self::with_time_source(conn, Arc::new(SystemTimeSource))
    }

    /// The clock decides "today" for the no-show window.
    pub fn with_time_source(conn: Connection, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            conn: Mutex::new(conn),
            clock,
        }
    }

    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self::new(sqlite::open_database(path)?))
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::new(sqlite::open_memory_database()?))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }

    // ── Patients ────────────────────────────────────────────

    pub fn create_patient(&self, new: &NewPatient) -> Result<Patient, DatabaseError> {
        repository::insert_patient(&*self.conn()?, new)
    }

    pub fn get_patient(&self, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
        repository::get_patient(&*self.conn()?, id)
    }

    pub fn update_patient(&self, patient: &Patient) -> Result<(), DatabaseError> {
        repository::update_patient(&*self.conn()?, patient)
    }

    pub fn delete_patient(&self, id: &Uuid) -> Result<(), DatabaseError> {
        repository::delete_patient(&*self.conn()?, id)
    }

    pub fn list_patients(&self) -> Result<Vec<Patient>, DatabaseError> {
        repository::list_patients(&*self.conn()?)
    }

    pub fn search_patients(&self, term: &str) -> Result<Vec<Patient>, DatabaseError> {
        repository::search_patients(&*self.conn()?, term)
    }

    pub fn list_no_shows(&self, patient_id: &Uuid) -> Result<Vec<NoShowRecord>, DatabaseError> {
        repository::list_no_shows_for_patient(&*self.conn()?, patient_id)
    }

    // ── Clinic settings ─────────────────────────────────────

    pub fn get_clinic_settings(&self) -> Result<ClinicSettings, DatabaseError> {
        repository::get_clinic_settings(&*self.conn()?)
    }

    pub fn save_clinic_settings(&self, settings: &ClinicSettings) -> Result<(), DatabaseError> {
        repository::save_clinic_settings(&*self.conn()?, settings)
    }
}

impl AppointmentStore for SqliteStore {
    fn list_appointments_by_date(&self, date: NaiveDate) -> Result<Vec<Appointment>, DatabaseError> {
        repository::list_appointments_by_date(&*self.conn()?, &date)
    }

    fn list_appointments_by_patient(&self, patient_id: &Uuid) -> Result<Vec<Appointment>, DatabaseError> {
        repository::list_appointments_by_patient(&*self.conn()?, patient_id)
    }

    fn get_appointment(&self, id: &Uuid) -> Result<Option<Appointment>, DatabaseError> {
        repository::get_appointment(&*self.conn()?, id)
    }

    fn create_appointment(&self, new: &NewAppointment) -> Result<Uuid, DatabaseError> {
        repository::insert_appointment(&*self.conn()?, new)
    }

    fn update_appointment(&self, appt: &Appointment) -> Result<(), DatabaseError> {
        repository::update_appointment(&*self.conn()?, appt)
    }

    fn delete_appointment(&self, id: &Uuid) -> Result<(), DatabaseError> {
        repository::delete_appointment(&*self.conn()?, id)
    }

    fn set_appointment_state(&self, id: &Uuid, state: AppointmentState) -> Result<bool, DatabaseError> {
        repository::set_appointment_state(&*self.conn()?, id, state)
    }

    fn has_recent_no_show(&self, patient_id: &Uuid, window_months: u32) -> Result<bool, DatabaseError> {
        let today = self.clock.today();
        let since = today
            .checked_sub_months(Months::new(window_months))
            .unwrap_or(NaiveDate::MIN);
        repository::has_no_show_since(&*self.conn()?, patient_id, &since)
    }

    fn record_no_show(
        &self,
        patient_id: &Uuid,
        appointment_id: &Uuid,
        date: NaiveDate,
    ) -> Result<(), DatabaseError> {
        repository::insert_no_show(&*self.conn()?, patient_id, appointment_id, &date)?;
        Ok(())
    }
}

impl LicenseStore for SqliteStore {
    fn get_license(&self) -> Result<Option<LicenseRecord>, DatabaseError> {
        repository::get_license(&*self.conn()?)
    }

    fn save_license(&self, license: &LicenseRecord) -> Result<(), DatabaseError> {
        repository::save_license(&*self.conn()?, license)
    }
}
