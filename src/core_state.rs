//! Application state shared by every command.
//!
//! `CoreState` owns the store handle, both engines and the UI event sink.
//! Everything is wired explicitly at startup; there is no global connection
//! and no hard-coded license secret.

use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use rusqlite::Connection;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::agenda::{AgendaError, AgendaService};
use crate::clock::{SystemTimeSource, TimeSource};
use crate::config::{AppConfig, ConfigError};
use crate::db::{self, AppointmentStore, DatabaseError, SqliteStore};
use crate::events::{self, EventSink, TracingEventSink};
use crate::license::{KeyGenerator, LicenseError, LicenseService};
use crate::messages;
use crate::models::*;
use crate::seed;

const MAX_NAME_LEN: usize = 200;

// ─── CoreState ────────────────────────────────────────────────────────────────

pub struct CoreState {
    store: Arc<SqliteStore>,
    agenda: AgendaService,
    license: LicenseService,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn TimeSource>,
}

impl CoreState {
    /// Wire a state around an already-migrated connection.
    pub fn new(
        conn: Connection,
        license_secret: &str,
        clock: Arc<dyn TimeSource>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let store = Arc::new(SqliteStore::with_time_source(conn, clock.clone()));
        let agenda = AgendaService::new(store.clone(), clock.clone());
        let license = LicenseService::new(
            store.clone(),
            KeyGenerator::new(license_secret),
            clock.clone(),
        );
        Self {
            store,
            agenda,
            license,
            events,
            clock,
        }
    }

    /// Open (or create) the on-disk ledger described by `config`.
    pub fn open(config: &AppConfig) -> Result<Self, CoreError> {
        let path = config.database_path();
        let conn = db::open_database(&path)?;
        let state = Self::new(
            conn,
            &config.license_secret,
            Arc::new(SystemTimeSource),
            Arc::new(TracingEventSink),
        );

        if config.seed_demo_data {
            state.seed_demo_data()?;
        }

        tracing::info!(path = %path.display(), "Ledger opened");
        Ok(state)
    }

    /// Throwaway ledger for tests and demos.
    pub fn open_in_memory(
        license_secret: &str,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, CoreError> {
        let conn = db::open_memory_database()?;
        Ok(Self::new(conn, license_secret, clock, Arc::new(TracingEventSink)))
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn seed_demo_data(&self) -> Result<bool, CoreError> {
        Ok(seed::seed_demo_data(&self.store, self.today())?)
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    pub fn agenda(&self) -> &AgendaService {
        &self.agenda
    }

    pub fn license(&self) -> &LicenseService {
        &self.license
    }

    /// Pass-through for events raised by the presentation layer itself.
    pub fn emit_event(&self, event: &str, payload: Value) {
        self.events.emit(event, payload);
    }

    // ── Agenda ──────────────────────────────────────────────

    pub fn daily_agenda(&self, date: NaiveDate) -> Result<DailyAgenda, CoreError> {
        Ok(self.agenda.daily_agenda(date)?)
    }

    pub fn next_appointment(&self, date: NaiveDate) -> Result<Option<Appointment>, CoreError> {
        let agenda = self.agenda.daily_agenda(date)?;
        Ok(self.agenda.next_appointment(&agenda.appointments).cloned())
    }

    /// Parses a wire state name and routes it to the matching transition.
    /// The change event is emitted only when a stored appointment changed.
    pub fn change_appointment_state(&self, id: &Uuid, state_name: &str) -> Result<(), CoreError> {
        let state = AppointmentState::from_str(state_name.trim())
            .map_err(|_| CoreError::Validation(format!("Unknown appointment state: {state_name}")))?;
        if self.agenda.change_state(id, state)? {
            self.events.emit(
                events::APPOINTMENT_STATE_CHANGED,
                json!({ "id": id, "estado": state }),
            );
        }
        Ok(())
    }

    pub fn get_appointment(&self, id: &Uuid) -> Result<Appointment, CoreError> {
        Ok(self.agenda.get_appointment(id)?)
    }

    pub fn create_appointment(&self, new: &NewAppointment) -> Result<Appointment, CoreError> {
        let id = self.agenda.book(new)?;
        let appt = self.agenda.get_appointment(&id)?;
        self.events.emit(events::APPOINTMENT_SAVED, json!({ "id": id, "fecha": appt.date }));
        Ok(appt)
    }

    pub fn update_appointment(&self, appt: &Appointment) -> Result<(), CoreError> {
        self.agenda.update(appt)?;
        self.events.emit(
            events::APPOINTMENT_SAVED,
            json!({ "id": appt.id, "fecha": appt.date }),
        );
        Ok(())
    }

    pub fn delete_appointment(&self, id: &Uuid) -> Result<(), CoreError> {
        self.agenda.delete(id)?;
        self.events.emit(events::APPOINTMENT_DELETED, json!({ "id": id }));
        Ok(())
    }

    pub fn patient_history(&self, patient_id: &Uuid) -> Result<Vec<Appointment>, CoreError> {
        Ok(self.agenda.patient_history(patient_id)?)
    }

    /// Renders a patient message for an appointment. Delay messages use the
    /// current delay of that appointment's day.
    pub fn compose_message(&self, id: &Uuid, kind: MessageKind) -> Result<String, CoreError> {
        let appt = self.agenda.get_appointment(id)?;
        let delay = match kind {
            MessageKind::Delay => {
                let day = self.store.list_appointments_by_date(appt.date)?;
                self.agenda.current_delay(&day)
            }
            _ => 0,
        };
        let settings = self.store.get_clinic_settings()?;
        Ok(messages::compose_message(&settings, kind, &appt, delay))
    }

    // ── Patients ────────────────────────────────────────────

    pub fn get_patient(&self, id: &Uuid) -> Result<Patient, CoreError> {
        self.store
            .get_patient(id)?
            .ok_or_else(|| CoreError::Database(DatabaseError::not_found("Patient", id)))
    }

    pub fn list_patients(&self) -> Result<Vec<Patient>, CoreError> {
        Ok(self.store.list_patients()?)
    }

    pub fn search_patients(&self, term: &str) -> Result<Vec<Patient>, CoreError> {
        Ok(self.store.search_patients(term.trim())?)
    }

    pub fn create_patient(&self, new: &NewPatient) -> Result<Patient, CoreError> {
        validate_patient_name(&new.name)?;
        let patient = self.store.create_patient(new)?;
        tracing::info!(patient_id = %patient.id, "Patient created");
        self.events.emit(events::PATIENT_SAVED, json!({ "id": patient.id }));
        Ok(patient)
    }

    pub fn update_patient(&self, patient: &Patient) -> Result<(), CoreError> {
        validate_patient_name(&patient.name)?;
        self.store.update_patient(patient)?;
        self.events.emit(events::PATIENT_SAVED, json!({ "id": patient.id }));
        Ok(())
    }

    /// Also removes the patient's appointments and no-show history.
    pub fn delete_patient(&self, id: &Uuid) -> Result<(), CoreError> {
        self.store.delete_patient(id)?;
        tracing::info!(patient_id = %id, "Patient deleted");
        self.events.emit(events::PATIENT_DELETED, json!({ "id": id }));
        Ok(())
    }

    // ── Clinic settings ─────────────────────────────────────

    pub fn clinic_settings(&self) -> Result<ClinicSettings, CoreError> {
        Ok(self.store.get_clinic_settings()?)
    }

    pub fn save_clinic_settings(&self, settings: &ClinicSettings) -> Result<(), CoreError> {
        self.store.save_clinic_settings(settings)?;
        self.events.emit(events::SETTINGS_SAVED, Value::Null);
        Ok(())
    }

    // ── License ─────────────────────────────────────────────

    pub fn activate_license(&self, key: &str) -> Result<LicenseInfo, CoreError> {
        let info = self.license.validate_and_activate(key)?;
        self.events.emit(
            events::LICENSE_ACTIVATED,
            json!({ "estado": info.status, "diasRestantes": info.days_remaining }),
        );
        Ok(info)
    }

    pub fn license_info(&self) -> Result<LicenseInfo, CoreError> {
        Ok(self.license.info()?)
    }

    pub fn requires_activation(&self) -> Result<bool, CoreError> {
        Ok(self.license.requires_activation()?)
    }

    pub fn has_active_license(&self) -> Result<bool, CoreError> {
        Ok(self.license.has_active_license()?)
    }
}

fn validate_patient_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation("Patient name is required".into()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(CoreError::Validation("Patient name too long".into()));
    }
    Ok(())
}

// ─── Errors ───────────────────────────────────────────────────────────────────

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error(transparent)]
    Agenda(#[from] AgendaError),
    #[error(transparent)]
    License(#[from] LicenseError),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

// ─── Tests ────────────────────────────────────────────────────────────────────
