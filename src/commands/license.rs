//! License commands. Activation never blocks the rest of the app: an
//! expired license only ends the update window.

use crate::core_state::CoreState;
use crate::models::LicenseInfo;

pub fn validate_and_activate_license(state: &CoreState, key: &str) -> Result<LicenseInfo, String> {
    state.activate_license(key).map_err(|e| e.to_string())
}

pub fn get_license_info(state: &CoreState) -> Result<LicenseInfo, String> {
    state.license_info().map_err(|e| e.to_string())
}

pub fn requires_activation(state: &CoreState) -> Result<bool, String> {
    state.requires_activation().map_err(|e| e.to_string())
}

pub fn has_active_license(state: &CoreState) -> Result<bool, String> {
    state.has_active_license().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support;
    use crate::license::KeyGenerator;

    #[test]
    fn activation_flow() {
        let (state, _) = test_support::state();
        assert!(requires_activation(&state).unwrap());
        let info = get_license_info(&state).unwrap();
        assert_eq!(info.status.as_str(), "no_configurada");

        let key = KeyGenerator::new(test_support::SECRET).generate_key(2026);
        let info = validate_and_activate_license(&state, &key.to_lowercase()).unwrap();
        assert_eq!(info.status.as_str(), "activa");
        assert!(!requires_activation(&state).unwrap());
        assert!(has_active_license(&state).unwrap());
    }

    #[test]
    fn errors_are_readable() {
        let (state, _) = test_support::state();
        assert_eq!(
            validate_and_activate_license(&state, "YOY2026-0000-0000").unwrap_err(),
            "Invalid license key"
        );
        let err = validate_and_activate_license(&state, "ABC").unwrap_err();
        assert!(err.starts_with("Invalid license format"), "{err}");
    }
}
