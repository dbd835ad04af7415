//! Agenda engine: the daily schedule view, its lateness estimate and the
//! appointment state transitions.
//!
//! Delay and "next appointment" are relative to the caller's current time
//! and are recomputed on every call. Any state may move to any other state;
//! only an absence carries a side effect (a dated no-show record).

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;
use uuid::Uuid;

use crate::clock::TimeSource;
use crate::db::{AppointmentStore, DatabaseError};
use crate::models::*;

/// Trailing window, in calendar months, for the no-show risk flag.
pub const NO_SHOW_WINDOW_MONTHS: u32 = 3;

/// An appointment stays "next" up to this many minutes after its slot.
pub const NEXT_APPOINTMENT_GRACE_MINUTES: i64 = 30;

/// Longest accepted appointment reason, in characters.
pub const MAX_REASON_CHARS: usize = 500;

#[derive(Error, Debug)]
pub enum AgendaError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Store error: {0}")]
    Store(#[source] DatabaseError),
}

impl From<DatabaseError> for AgendaError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, id } => Self::NotFound { entity_type, id },
            other => Self::Store(other),
        }
    }
}

// ─── Pure computations ────────────────────────────────────────────────────────

/// Worst-case lateness in minutes: the largest `now - slot` among pending,
/// confirmed or attended appointments whose slot is strictly before `now`.
/// Zero when nothing qualifies.
pub fn calculate_delay(appointments: &[Appointment], now: NaiveTime) -> i64 {
    let now_minutes = minute_of_day(now);
    appointments
        .iter()
        .filter(|a| a.state.counts_toward_delay())
        .map(Appointment::minute_of_day)
        .filter(|&slot| slot < now_minutes)
        .map(|slot| now_minutes - slot)
        .max()
        .unwrap_or(0)
}

/// First pending or confirmed appointment, in list order, whose slot is no
/// more than the grace period in the past.
pub fn next_appointment(appointments: &[Appointment], now: NaiveTime) -> Option<&Appointment> {
    let cutoff = minute_of_day(now) - NEXT_APPOINTMENT_GRACE_MINUTES;
    appointments
        .iter()
        .find(|a| a.state.is_pending() && a.minute_of_day() >= cutoff)
}

/// Appointments still expected today (pending or confirmed).
pub fn count_pending(appointments: &[Appointment]) -> usize {
    appointments.iter().filter(|a| a.state.is_pending()).count()
}

// ─── Service ──────────────────────────────────────────────────────────────────

/// Stateless orchestration over the appointment store.
pub struct AgendaService {
    store: Arc<dyn AppointmentStore>,
    clock: Arc<dyn TimeSource>,
}

impl AgendaService {
    pub fn new(store: Arc<dyn AppointmentStore>, clock: Arc<dyn TimeSource>) -> Self {
        Self { store, clock }
    }

    /// Builds the day view: appointments by time, each flagged with no-show
    /// risk, plus delay and pending counts against the current time.
    pub fn daily_agenda(&self, date: NaiveDate) -> Result<DailyAgenda, AgendaError> {
        let mut appointments = self.store.list_appointments_by_date(date)?;

        for appt in &mut appointments {
            appt.no_show_risk = self
                .store
                .has_recent_no_show(&appt.patient_id, NO_SHOW_WINDOW_MONTHS)?;
        }

        let delay_minutes = self.current_delay(&appointments);
        let pending_count = count_pending(&appointments);
        let total_count = appointments.len();

        tracing::debug!(
            %date,
            total_count,
            pending_count,
            delay_minutes,
            "Computed daily agenda"
        );

        Ok(DailyAgenda {
            date,
            appointments,
            delay_minutes,
            total_count,
            pending_count,
        })
    }

    pub fn current_delay(&self, appointments: &[Appointment]) -> i64 {
        calculate_delay(appointments, self.clock.now().time())
    }

    pub fn next_appointment<'a>(&self, appointments: &'a [Appointment]) -> Option<&'a Appointment> {
        next_appointment(appointments, self.clock.now().time())
    }

    // ── Transitions ─────────────────────────────────────────

    /// Transitions report whether a stored appointment actually changed.
    /// Unknown ids are a silent no-op and return `false`.
    pub fn mark_attended(&self, id: &Uuid) -> Result<bool, AgendaError> {
        self.write_state(id, AppointmentState::Attended)
    }

    /// Marks the appointment absent and appends a no-show dated today.
    /// Unknown ids record nothing.
    pub fn mark_absent(&self, id: &Uuid) -> Result<bool, AgendaError> {
        let Some(appt) = self.store.get_appointment(id)? else {
            tracing::warn!(appointment_id = %id, "Absence for unknown appointment ignored");
            return Ok(false);
        };

        if !self.store.set_appointment_state(id, AppointmentState::Absent)? {
            tracing::warn!(appointment_id = %id, "Appointment vanished before absence was written");
            return Ok(false);
        }
        let today = self.clock.today();
        self.store.record_no_show(&appt.patient_id, id, today)?;
        tracing::info!(
            appointment_id = %id,
            patient_id = %appt.patient_id,
            %today,
            "Appointment marked absent, no-show recorded"
        );
        Ok(true)
    }

    pub fn mark_cancelled(&self, id: &Uuid) -> Result<bool, AgendaError> {
        self.write_state(id, AppointmentState::Cancelled)
    }

    pub fn confirm(&self, id: &Uuid) -> Result<bool, AgendaError> {
        self.write_state(id, AppointmentState::Confirmed)
    }

    /// Direct state write with no side effect.
    pub fn set_state(&self, id: &Uuid, state: AppointmentState) -> Result<bool, AgendaError> {
        self.write_state(id, state)
    }

    /// Routes a requested state to its transition.
    pub fn change_state(&self, id: &Uuid, state: AppointmentState) -> Result<bool, AgendaError> {
        match state {
            AppointmentState::Attended => self.mark_attended(id),
            AppointmentState::Absent => self.mark_absent(id),
            AppointmentState::Cancelled => self.mark_cancelled(id),
            AppointmentState::Confirmed => self.confirm(id),
            other => self.set_state(id, other),
        }
    }

    fn write_state(&self, id: &Uuid, state: AppointmentState) -> Result<bool, AgendaError> {
        let changed = self.store.set_appointment_state(id, state)?;
        if changed {
            tracing::info!(appointment_id = %id, state = state.as_str(), "Appointment state changed");
        } else {
            tracing::warn!(
                appointment_id = %id,
                state = state.as_str(),
                "State change for unknown appointment ignored"
            );
        }
        Ok(changed)
    }

    // ── Booking ─────────────────────────────────────────────

    pub fn get_appointment(&self, id: &Uuid) -> Result<Appointment, AgendaError> {
        self.store
            .get_appointment(id)?
            .ok_or_else(|| AgendaError::NotFound {
                entity_type: "Appointment".into(),
                id: id.to_string(),
            })
    }

    pub fn book(&self, new: &NewAppointment) -> Result<Uuid, AgendaError> {
        validate_booking(new.duration_minutes, &new.reason)?;
        let id = self.store.create_appointment(new)?;
        tracing::info!(
            appointment_id = %id,
            patient_id = %new.patient_id,
            date = %new.date,
            "Appointment booked"
        );
        Ok(id)
    }

    pub fn update(&self, appt: &Appointment) -> Result<(), AgendaError> {
        validate_booking(appt.duration_minutes, &appt.reason)?;
        self.store.update_appointment(appt)?;
        Ok(())
    }

    pub fn delete(&self, id: &Uuid) -> Result<(), AgendaError> {
        self.store.delete_appointment(id)?;
        tracing::info!(appointment_id = %id, "Appointment deleted");
        Ok(())
    }

    /// All appointments for a patient, most recent first.
    pub fn patient_history(&self, patient_id: &Uuid) -> Result<Vec<Appointment>, AgendaError> {
        Ok(self.store.list_appointments_by_patient(patient_id)?)
    }
}

fn validate_booking(duration_minutes: u32, reason: &str) -> Result<(), AgendaError> {
    if duration_minutes == 0 {
        return Err(AgendaError::Validation(
            "Appointment duration must be greater than zero".into(),
        ));
    }
    if reason.chars().count() > MAX_REASON_CHARS {
        return Err(AgendaError::Validation(format!(
            "Appointment reason too long (max {MAX_REASON_CHARS} chars)"
        )));
    }
    Ok(())
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedTimeSource;
    use crate::db::SqliteStore;
    use chrono::NaiveDateTime;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn t(s: &str) -> NaiveTime {
        parse_time_of_day(s).unwrap()
    }

    fn appt(time: &str, state: AppointmentState) -> Appointment {
        let stamp = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap().and_hms_opt(8, 0, 0).unwrap();
        Appointment {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            patient: None,
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            time: t(time),
            duration_minutes: 30,
            reason: "Consulta".into(),
            state,
            notes: None,
            no_show_risk: false,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    // ── calculate_delay ──

    #[test]
    fn delay_is_worst_case_not_sum() {
        let list = vec![
            appt("09:00", AppointmentState::Attended),
            appt("10:00", AppointmentState::Confirmed),
            appt("11:00", AppointmentState::Cancelled),
        ];
        assert_eq!(calculate_delay(&list, t("10:30")), 90);
    }

    #[test]
    fn delay_ignores_absent_and_cancelled() {
        let list = vec![
            appt("08:00", AppointmentState::Absent),
            appt("08:30", AppointmentState::Cancelled),
        ];
        assert_eq!(calculate_delay(&list, t("12:00")), 0);
    }

    #[test]
    fn delay_zero_when_all_in_future() {
        let list = vec![
            appt("14:00", AppointmentState::Pending),
            appt("15:00", AppointmentState::Confirmed),
        ];
        assert_eq!(calculate_delay(&list, t("10:00")), 0);
    }

    #[test]
    fn delay_zero_for_empty_day() {
        assert_eq!(calculate_delay(&[], t("10:00")), 0);
    }

    #[test]
    fn delay_requires_strictly_earlier_slot() {
        let list = vec![appt("10:00", AppointmentState::Pending)];
        assert_eq!(calculate_delay(&list, t("10:00")), 0);
        assert_eq!(calculate_delay(&list, t("10:01")), 1);
    }

    // ── next_appointment ──

    #[test]
    fn next_skips_attended_and_stale() {
        let list = vec![
            appt("09:00", AppointmentState::Attended),
            appt("09:30", AppointmentState::Pending),
            appt("10:00", AppointmentState::Confirmed),
            appt("10:30", AppointmentState::Pending),
        ];
        // 09:30 is 35 minutes old at 10:05; 10:00 is within the grace period
        let next = next_appointment(&list, t("10:05")).unwrap();
        assert_eq!(next.time, t("10:00"));
    }

    #[test]
    fn next_includes_exact_grace_boundary() {
        let list = vec![appt("09:30", AppointmentState::Pending)];
        assert!(next_appointment(&list, t("10:00")).is_some());
        assert!(next_appointment(&list, t("10:01")).is_none());
    }

    #[test]
    fn next_none_when_nothing_pending() {
        let list = vec![
            appt("11:00", AppointmentState::Cancelled),
            appt("12:00", AppointmentState::Absent),
        ];
        assert!(next_appointment(&list, t("09:00")).is_none());
    }

    // ── count_pending ──

    #[test]
    fn pending_counts_only_pending_and_confirmed() {
        let list = vec![
            appt("09:00", AppointmentState::Pending),
            appt("09:30", AppointmentState::Confirmed),
            appt("10:00", AppointmentState::Attended),
            appt("10:30", AppointmentState::Absent),
            appt("11:00", AppointmentState::Cancelled),
        ];
        assert_eq!(count_pending(&list), 2);
    }

    // ── AgendaService over SQLite ──

    struct Fixture {
        store: Arc<SqliteStore>,
        clock: Arc<FixedTimeSource>,
        service: AgendaService,
        patient: Uuid,
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(FixedTimeSource::new(at(9, 45)));
        let store = Arc::new(SqliteStore::with_time_source(
            crate::db::open_memory_database().unwrap(),
            clock.clone(),
        ));
        let patient = store
            .create_patient(&NewPatient {
                name: "María González".into(),
                phone: "+54 11 1234-5678".into(),
                ..Default::default()
            })
            .unwrap()
            .id;
        let service = AgendaService::new(store.clone(), clock.clone());
        Fixture {
            store,
            clock,
            service,
            patient,
        }
    }

    fn book(f: &Fixture, time: &str, state: AppointmentState) -> Uuid {
        f.service
            .book(&NewAppointment {
                patient_id: f.patient,
                date: f.clock.today(),
                time: t(time),
                duration_minutes: 30,
                reason: "Consulta general".into(),
                state,
                notes: None,
            })
            .unwrap()
    }

    #[test]
    fn daily_agenda_aggregates() {
        let f = fixture();
        book(&f, "09:00", AppointmentState::Pending);
        let agenda = f.service.daily_agenda(f.clock.today()).unwrap();
        assert_eq!(agenda.total_count, 1);
        assert_eq!(agenda.pending_count, 1);
        assert_eq!(agenda.delay_minutes, 45);
    }

    #[test]
    fn daily_agenda_recomputes_delay_each_call() {
        let f = fixture();
        book(&f, "09:00", AppointmentState::Confirmed);
        assert_eq!(f.service.daily_agenda(f.clock.today()).unwrap().delay_minutes, 45);
        f.clock.set(at(10, 15));
        assert_eq!(f.service.daily_agenda(f.clock.today()).unwrap().delay_minutes, 75);
    }

    #[test]
    fn daily_agenda_flags_no_show_risk() {
        let f = fixture();
        let id = book(&f, "09:00", AppointmentState::Confirmed);
        f.service.mark_absent(&id).unwrap();
        book(&f, "11:00", AppointmentState::Pending);

        let agenda = f.service.daily_agenda(f.clock.today()).unwrap();
        assert!(agenda.appointments.iter().all(|a| a.no_show_risk));
        assert_eq!(agenda.pending_count, 1);
    }

    #[test]
    fn daily_agenda_for_empty_day() {
        let f = fixture();
        let agenda = f
            .service
            .daily_agenda(NaiveDate::from_ymd_opt(2026, 3, 3).unwrap())
            .unwrap();
        assert_eq!(agenda.total_count, 0);
        assert_eq!(agenda.delay_minutes, 0);
        assert!(agenda.appointments.is_empty());
    }

    #[test]
    fn mark_absent_records_exactly_one_no_show_today() {
        let f = fixture();
        let id = book(&f, "09:00", AppointmentState::Confirmed);
        f.service.mark_absent(&id).unwrap();

        let appt = f.service.get_appointment(&id).unwrap();
        assert_eq!(appt.state, AppointmentState::Absent);
        let history = f.store.list_no_shows(&f.patient).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].date, f.clock.today());
        assert_eq!(history[0].appointment_id, id);
    }

    #[test]
    fn mark_absent_unknown_id_is_silent_noop() {
        let f = fixture();
        assert!(!f.service.mark_absent(&Uuid::new_v4()).unwrap());
        assert!(f.store.list_no_shows(&f.patient).unwrap().is_empty());
    }

    #[test]
    fn transitions_write_any_state_from_any_state() {
        let f = fixture();
        let id = book(&f, "09:00", AppointmentState::Cancelled);

        f.service.confirm(&id).unwrap();
        assert_eq!(f.service.get_appointment(&id).unwrap().state, AppointmentState::Confirmed);
        f.service.mark_attended(&id).unwrap();
        assert_eq!(f.service.get_appointment(&id).unwrap().state, AppointmentState::Attended);
        f.service.mark_cancelled(&id).unwrap();
        assert_eq!(f.service.get_appointment(&id).unwrap().state, AppointmentState::Cancelled);
        f.service.set_state(&id, AppointmentState::Pending).unwrap();
        assert_eq!(f.service.get_appointment(&id).unwrap().state, AppointmentState::Pending);
    }

    #[test]
    fn change_state_dispatches_absence_side_effect() {
        let f = fixture();
        let id = book(&f, "09:00", AppointmentState::Pending);
        f.service.change_state(&id, AppointmentState::Confirmed).unwrap();
        assert!(f.store.list_no_shows(&f.patient).unwrap().is_empty());
        f.service.change_state(&id, AppointmentState::Absent).unwrap();
        assert_eq!(f.store.list_no_shows(&f.patient).unwrap().len(), 1);
        f.service.change_state(&id, AppointmentState::Pending).unwrap();
        assert_eq!(f.service.get_appointment(&id).unwrap().state, AppointmentState::Pending);
    }

    #[test]
    fn transitions_on_unknown_id_succeed() {
        let f = fixture();
        let missing = Uuid::new_v4();
        assert!(!f.service.mark_attended(&missing).unwrap());
        assert!(!f.service.mark_cancelled(&missing).unwrap());
        assert!(!f.service.confirm(&missing).unwrap());
        assert!(!f.service.set_state(&missing, AppointmentState::Pending).unwrap());
        assert!(!f.service.change_state(&missing, AppointmentState::Absent).unwrap());
    }

    #[test]
    fn transitions_on_known_id_report_change() {
        let f = fixture();
        let id = book(&f, "09:00", AppointmentState::Pending);
        assert!(f.service.confirm(&id).unwrap());
        assert!(f.service.change_state(&id, AppointmentState::Absent).unwrap());
    }

    #[test]
    fn get_unknown_appointment_is_not_found() {
        let f = fixture();
        let err = f.service.get_appointment(&Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AgendaError::NotFound { .. }));
    }

    #[test]
    fn booking_validates_duration_and_patient() {
        let f = fixture();
        let mut new = NewAppointment {
            patient_id: f.patient,
            date: f.clock.today(),
            time: t("09:00"),
            duration_minutes: 0,
            reason: "x".into(),
            state: AppointmentState::Pending,
            notes: None,
        };
        assert!(matches!(f.service.book(&new), Err(AgendaError::Validation(_))));

        new.duration_minutes = 30;
        new.patient_id = Uuid::new_v4();
        assert!(matches!(f.service.book(&new), Err(AgendaError::NotFound { .. })));
    }

    #[test]
    fn reason_limit_counts_characters_not_bytes() {
        let f = fixture();
        let mut new = NewAppointment {
            patient_id: f.patient,
            date: f.clock.today(),
            time: t("09:00"),
            duration_minutes: 30,
            reason: "ñ".repeat(MAX_REASON_CHARS),
            state: AppointmentState::Pending,
            notes: None,
        };
        assert!(f.service.book(&new).is_ok());

        new.reason.push('é');
        assert!(matches!(f.service.book(&new), Err(AgendaError::Validation(_))));
    }

    #[test]
    fn next_appointment_uses_clock() {
        let f = fixture();
        book(&f, "09:00", AppointmentState::Attended);
        book(&f, "09:30", AppointmentState::Pending);
        book(&f, "10:00", AppointmentState::Pending);
        let agenda = f.service.daily_agenda(f.clock.today()).unwrap();
        let next = f.service.next_appointment(&agenda.appointments).unwrap();
        assert_eq!(next.time, t("09:30"));
    }

    #[test]
    fn history_and_delete() {
        let f = fixture();
        let a = book(&f, "09:00", AppointmentState::Pending);
        book(&f, "10:00", AppointmentState::Pending);
        assert_eq!(f.service.patient_history(&f.patient).unwrap().len(), 2);
        f.service.delete(&a).unwrap();
        assert_eq!(f.service.patient_history(&f.patient).unwrap().len(), 1);
        assert!(matches!(f.service.delete(&a), Err(AgendaError::NotFound { .. })));
    }

    // ── Store failures ──

    /// Delegates to SQLite but fails listing, or the nth no-show lookup,
    /// the way a poisoned connection lock would.
    struct FailingStore {
        inner: Arc<SqliteStore>,
        fail_listing: bool,
        no_show_calls_before_failure: Option<usize>,
        no_show_calls: AtomicUsize,
    }

    impl FailingStore {
        fn new(inner: Arc<SqliteStore>) -> Self {
            Self {
                inner,
                fail_listing: false,
                no_show_calls_before_failure: None,
                no_show_calls: AtomicUsize::new(0),
            }
        }
    }

    impl AppointmentStore for FailingStore {
        fn list_appointments_by_date(&self, date: NaiveDate) -> Result<Vec<Appointment>, DatabaseError> {
            if self.fail_listing {
                return Err(DatabaseError::LockPoisoned);
            }
            self.inner.list_appointments_by_date(date)
        }

        fn list_appointments_by_patient(&self, patient_id: &Uuid) -> Result<Vec<Appointment>, DatabaseError> {
            self.inner.list_appointments_by_patient(patient_id)
        }

        fn get_appointment(&self, id: &Uuid) -> Result<Option<Appointment>, DatabaseError> {
            self.inner.get_appointment(id)
        }

        fn create_appointment(&self, new: &NewAppointment) -> Result<Uuid, DatabaseError> {
            self.inner.create_appointment(new)
        }

        fn update_appointment(&self, appt: &Appointment) -> Result<(), DatabaseError> {
            self.inner.update_appointment(appt)
        }

        fn delete_appointment(&self, id: &Uuid) -> Result<(), DatabaseError> {
            self.inner.delete_appointment(id)
        }

        fn set_appointment_state(&self, id: &Uuid, state: AppointmentState) -> Result<bool, DatabaseError> {
            self.inner.set_appointment_state(id, state)
        }

        fn has_recent_no_show(&self, patient_id: &Uuid, window_months: u32) -> Result<bool, DatabaseError> {
            let call = self.no_show_calls.fetch_add(1, Ordering::SeqCst);
            if self.no_show_calls_before_failure.is_some_and(|n| call >= n) {
                return Err(DatabaseError::LockPoisoned);
            }
            self.inner.has_recent_no_show(patient_id, window_months)
        }

        fn record_no_show(
            &self,
            patient_id: &Uuid,
            appointment_id: &Uuid,
            date: NaiveDate,
        ) -> Result<(), DatabaseError> {
            self.inner.record_no_show(patient_id, appointment_id, date)
        }
    }

    #[test]
    fn daily_agenda_surfaces_listing_failure() {
        let f = fixture();
        book(&f, "09:00", AppointmentState::Pending);
        let failing = FailingStore {
            fail_listing: true,
            ..FailingStore::new(f.store.clone())
        };
        let service = AgendaService::new(Arc::new(failing), f.clock.clone());

        let err = service.daily_agenda(f.clock.today()).unwrap_err();
        assert!(matches!(err, AgendaError::Store(DatabaseError::LockPoisoned)));
    }

    #[test]
    fn daily_agenda_fails_whole_when_no_show_lookup_fails_mid_loop() {
        let f = fixture();
        book(&f, "09:00", AppointmentState::Pending);
        book(&f, "09:30", AppointmentState::Pending);
        book(&f, "10:00", AppointmentState::Pending);
        let failing = FailingStore {
            no_show_calls_before_failure: Some(1),
            ..FailingStore::new(f.store.clone())
        };
        let store = Arc::new(failing);
        let service = AgendaService::new(store.clone(), f.clock.clone());

        let err = service.daily_agenda(f.clock.today()).unwrap_err();
        assert!(matches!(err, AgendaError::Store(DatabaseError::LockPoisoned)));
        // the first lookup succeeded, the second stopped the loop
        assert_eq!(store.no_show_calls.load(Ordering::SeqCst), 2);
    }
}
