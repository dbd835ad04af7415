use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Singleton clinic display settings and patient message templates.
///
/// Templates accept `{nombre}`, `{fecha}`, `{hora}` and `{minutos}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicSettings {
    #[serde(rename = "nombreConsultorio")]
    pub clinic_name: String,
    #[serde(rename = "nombreMedico")]
    pub practitioner_name: String,
    #[serde(rename = "telefonoConsultorio")]
    pub clinic_phone: String,
    #[serde(rename = "direccion")]
    pub address: String,
    #[serde(rename = "mensajeConfirmacion")]
    pub confirmation_template: String,
    #[serde(rename = "mensajeRecordatorio")]
    pub reminder_template: String,
    #[serde(rename = "mensajeDemora")]
    pub delay_template: String,
    #[serde(rename = "horarioAtencion")]
    pub opening_hours: String,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
}

impl Default for ClinicSettings {
    fn default() -> Self {
        Self {
            clinic_name: "Consultorio Médico".into(),
            practitioner_name: String::new(),
            clinic_phone: String::new(),
            address: String::new(),
            confirmation_template: "Hola {nombre}, le confirmamos su turno para el {fecha} a las {hora}. \
                Por favor responda \"CONFIRMAR\" o \"CANCELAR\"."
                .into(),
            reminder_template: "Hola {nombre}, le recordamos su turno mañana {fecha} a las {hora}.".into(),
            delay_template: "Hola {nombre}, le informamos que el consultorio tiene {minutos} minutos de demora. \
                Su turno será atendido lo antes posible."
                .into(),
            opening_hours: "Lunes a Viernes de 9:00 a 18:00".into(),
            updated_at: None,
        }
    }
}
