//! Clinic settings and UI event pass-through.

use serde_json::Value;

use crate::core_state::CoreState;
use crate::models::ClinicSettings;

pub fn get_clinic_settings(state: &CoreState) -> Result<ClinicSettings, String> {
    state.clinic_settings().map_err(|e| e.to_string())
}

pub fn save_clinic_settings(state: &CoreState, settings: ClinicSettings) -> Result<(), String> {
    if settings.clinic_name.trim().is_empty() {
        return Err("Clinic name is required".into());
    }
    state
        .save_clinic_settings(&settings)
        .map_err(|e| e.to_string())
}

pub fn emit_event(state: &CoreState, evento: &str, data: Value) {
    state.emit_event(evento, data);
}
