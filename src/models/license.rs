use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::LicenseStatus;

/// The single persisted license. Overwritten on every activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseRecord {
    #[serde(rename = "licenseKey")]
    pub key: String,
    #[serde(rename = "fechaActivacion")]
    pub activated_at: NaiveDateTime,
    #[serde(rename = "fechaExpiracion")]
    pub expires_at: NaiveDateTime,
    #[serde(rename = "activa")]
    pub active: bool,
    pub version: String,
}

/// Derived at query time, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseInfo {
    #[serde(rename = "estado")]
    pub status: LicenseStatus,
    #[serde(rename = "fechaActivacion", default, skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<NaiveDateTime>,
    #[serde(rename = "fechaExpiracion", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<NaiveDateTime>,
    #[serde(rename = "diasRestantes")]
    pub days_remaining: i64,
    #[serde(rename = "mensaje")]
    pub message: String,
}
