//! Patient commands.

use super::parse_id;
use crate::core_state::CoreState;
use crate::models::{NewPatient, Patient};

pub fn get_patient(state: &CoreState, id: &str) -> Result<Patient, String> {
    let id = parse_id(id)?;
    state.get_patient(&id).map_err(|e| e.to_string())
}

/// Case-insensitive match on name or phone, at most 20 results.
pub fn search_patients(state: &CoreState, termino: &str) -> Result<Vec<Patient>, String> {
    state.search_patients(termino).map_err(|e| e.to_string())
}

pub fn list_patients(state: &CoreState) -> Result<Vec<Patient>, String> {
    state.list_patients().map_err(|e| e.to_string())
}

pub fn create_patient(state: &CoreState, patient: NewPatient) -> Result<Patient, String> {
    state.create_patient(&patient).map_err(|e| e.to_string())
}

pub fn update_patient(state: &CoreState, patient: Patient) -> Result<(), String> {
    state.update_patient(&patient).map_err(|e| e.to_string())
}

pub fn delete_patient(state: &CoreState, id: &str) -> Result<(), String> {
    let id = parse_id(id)?;
    state.delete_patient(&id).map_err(|e| e.to_string())
}
