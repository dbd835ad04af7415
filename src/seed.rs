//! Demo ledger for first start: six patients, a full morning of
//! appointments today and one past no-show.

use chrono::{Months, NaiveDate};

use crate::db::{AppointmentStore, DatabaseError, SqliteStore};
use crate::models::*;

struct DemoPatient {
    name: &'static str,
    phone: &'static str,
    email: Option<&'static str>,
    notes: Option<&'static str>,
}

const PATIENTS: [DemoPatient; 6] = [
    DemoPatient { name: "María González", phone: "+54 11 1234-5678", email: Some("maria@email.com"), notes: None },
    DemoPatient { name: "Juan Pérez", phone: "+54 11 2345-6789", email: Some("juan@email.com"), notes: None },
    DemoPatient { name: "Ana Rodríguez", phone: "+54 11 3456-7890", email: Some("ana@email.com"), notes: None },
    DemoPatient { name: "Carlos López", phone: "+54 11 4567-8901", email: Some("carlos@email.com"), notes: None },
    DemoPatient { name: "Laura Martínez", phone: "+54 11 5678-9012", email: Some("laura@email.com"), notes: None },
    DemoPatient {
        name: "Pedro Sánchez",
        phone: "+54 11 6789-0123",
        email: None,
        notes: Some("Paciente con historial de no-show"),
    },
];

/// (patient index, time, reason, state)
const APPOINTMENTS: [(usize, &str, &str, AppointmentState); 8] = [
    (0, "09:00", "Consulta general", AppointmentState::Attended),
    (1, "09:30", "Control de presión", AppointmentState::Attended),
    (2, "10:00", "Dolor de cabeza", AppointmentState::Confirmed),
    (3, "10:30", "Chequeo anual", AppointmentState::Confirmed),
    (4, "11:00", "Receta médica", AppointmentState::Pending),
    (5, "11:30", "Seguimiento", AppointmentState::Pending),
    (0, "12:00", "Resultados de laboratorio", AppointmentState::Confirmed),
    (2, "12:30", "Consulta de seguimiento", AppointmentState::Pending),
];

const NO_SHOW_PATIENT: usize = 5;
const DEMO_DURATION_MINUTES: u32 = 30;

/// Seeds only an empty ledger. Returns whether anything was inserted.
pub fn seed_demo_data(store: &SqliteStore, today: NaiveDate) -> Result<bool, DatabaseError> {
    if !store.list_patients()?.is_empty() {
        tracing::debug!("Ledger already has patients, skipping demo data");
        return Ok(false);
    }

    let mut patient_ids = Vec::with_capacity(PATIENTS.len());
    for demo in &PATIENTS {
        let patient = store.create_patient(&NewPatient {
            name: demo.name.into(),
            phone: demo.phone.into(),
            email: demo.email.map(Into::into),
            notes: demo.notes.map(Into::into),
        })?;
        patient_ids.push(patient.id);
    }

    let mut no_show_appointment = None;
    for (idx, time, reason, state) in APPOINTMENTS {
        let time = parse_time_of_day(time)
            .map_err(|e| DatabaseError::ConstraintViolation(format!("demo time {time}: {e}")))?;
        let id = store.create_appointment(&NewAppointment {
            patient_id: patient_ids[idx],
            date: today,
            time,
            duration_minutes: DEMO_DURATION_MINUTES,
            reason: reason.into(),
            state,
            notes: None,
        })?;
        if idx == NO_SHOW_PATIENT {
            no_show_appointment = Some(id);
        }
    }

    if let Some(appointment_id) = no_show_appointment {
        let when = today.checked_sub_months(Months::new(1)).unwrap_or(today);
        store.record_no_show(&patient_ids[NO_SHOW_PATIENT], &appointment_id, when)?;
    }

    tracing::info!(
        patients = PATIENTS.len(),
        appointments = APPOINTMENTS.len(),
        %today,
        "Demo data seeded"
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agenda::AgendaService;
    use crate::clock::{FixedTimeSource, TimeSource};
    use std::sync::Arc;

    fn store_at_ten_forty() -> (Arc<SqliteStore>, Arc<FixedTimeSource>) {
        let clock = Arc::new(FixedTimeSource::new(
            NaiveDate::from_ymd_opt(2026, 5, 4).unwrap().and_hms_opt(10, 40, 0).unwrap(),
        ));
        let store = Arc::new(SqliteStore::with_time_source(
            crate::db::open_memory_database().unwrap(),
            clock.clone(),
        ));
        (store, clock)
    }

    #[test]
    fn seeds_empty_ledger_once() {
        let (store, clock) = store_at_ten_forty();
        let today = clock.now().date();
        assert!(seed_demo_data(&store, today).unwrap());
        assert!(!seed_demo_data(&store, today).unwrap());

        assert_eq!(store.list_patients().unwrap().len(), 6);
        assert_eq!(store.list_appointments_by_date(today).unwrap().len(), 8);
    }

    #[test]
    fn seeded_day_has_expected_agenda() {
        let (store, clock) = store_at_ten_forty();
        let today = clock.now().date();
        seed_demo_data(&store, today).unwrap();

        let agenda = AgendaService::new(store.clone(), clock)
            .daily_agenda(today)
            .unwrap();
        assert_eq!(agenda.total_count, 8);
        assert_eq!(agenda.pending_count, 6);
        // 09:00 attended is the oldest qualifying slot
        assert_eq!(agenda.delay_minutes, 100);

        let flagged: Vec<_> = agenda
            .appointments
            .iter()
            .filter(|a| a.no_show_risk)
            .filter_map(|a| a.patient.as_ref().map(|p| p.name.as_str()))
            .collect();
        assert_eq!(flagged, vec!["Pedro Sánchez"]);
    }
}
