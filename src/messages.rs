//! Patient-facing message text and delay presentation.
//!
//! Templates come from `ClinicSettings` and may contain `{nombre}`,
//! `{fecha}`, `{hora}` and `{minutos}`. An empty template falls back to the
//! built-in wording.

use chrono::NaiveDate;

use crate::models::*;

const MESSAGE_DATE_FORMAT: &str = "%d/%m/%Y";

/// Upper bound (inclusive) of a delay still shown as minor.
pub const MINOR_DELAY_MINUTES: i64 = 15;

/// Values substituted into a template.
#[derive(Debug, Clone, Default)]
pub struct TemplateVars<'a> {
    pub first_name: &'a str,
    pub date: Option<NaiveDate>,
    pub time: Option<chrono::NaiveTime>,
    pub delay_minutes: i64,
}

pub fn render_template(template: &str, vars: &TemplateVars<'_>) -> String {
    let date = vars
        .date
        .map(|d| d.format(MESSAGE_DATE_FORMAT).to_string())
        .unwrap_or_default();
    let time = vars.time.map(format_time_of_day).unwrap_or_default();

    template
        .replace("{nombre}", vars.first_name)
        .replace("{fecha}", &date)
        .replace("{hora}", &time)
        .replace("{minutos}", &vars.delay_minutes.to_string())
}

fn template_for(settings: &ClinicSettings, kind: MessageKind) -> &str {
    match kind {
        MessageKind::Confirmation => &settings.confirmation_template,
        MessageKind::Reminder => &settings.reminder_template,
        MessageKind::Delay => &settings.delay_template,
    }
}

/// Message of the given kind for one appointment.
pub fn compose_message(
    settings: &ClinicSettings,
    kind: MessageKind,
    appointment: &Appointment,
    delay_minutes: i64,
) -> String {
    let first_name = appointment
        .patient
        .as_ref()
        .map(Patient::first_name)
        .unwrap_or_default();
    let vars = TemplateVars {
        first_name,
        date: Some(appointment.date),
        time: Some(appointment.time),
        delay_minutes,
    };

    let configured = template_for(settings, kind);
    if configured.trim().is_empty() {
        let fallback = ClinicSettings::default();
        render_template(template_for(&fallback, kind), &vars)
    } else {
        render_template(configured, &vars)
    }
}

pub fn delay_tier(delay_minutes: i64) -> DelayTier {
    match delay_minutes {
        m if m <= 0 => DelayTier::OnTime,
        m if m <= MINOR_DELAY_MINUTES => DelayTier::Minor,
        _ => DelayTier::Major,
    }
}

/// "A tiempo", "12 min de atraso", "1h 15m de atraso".
pub fn delay_label(delay_minutes: i64) -> String {
    if delay_minutes <= 0 {
        return "A tiempo".into();
    }
    if delay_minutes < 60 {
        return format!("{delay_minutes} min de atraso");
    }
    format!("{}h {}m de atraso", delay_minutes / 60, delay_minutes % 60)
}
