//! Perpetual license with a one-year update window.
//!
//! Keys are content-derived: `YOY<year>-XXXX-XXXX`, where the two groups are
//! the first eight hex digits of SHA-256 over `secret || year || version`.
//! Anyone holding the secret can mint a key for any year. The key only
//! gates casual copying.

use std::sync::Arc;

use chrono::{Months, NaiveDateTime};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::clock::TimeSource;
use crate::db::{DatabaseError, LicenseStore};
use crate::models::{LicenseInfo, LicenseRecord, LicenseStatus, LicenseTerm};

pub const LICENSE_PREFIX: &str = "YOY";
pub const LICENSE_SEPARATOR: char = '-';
/// Mixed into every key derivation.
pub const LICENSE_VERSION: &str = "1.0.0";
/// Remaining days at or below which the update window is "expiring soon".
pub const EXPIRY_WARNING_DAYS: i64 = 30;

const UPDATE_WINDOW_MONTHS: u32 = 12;
const SECONDS_PER_DAY: i64 = 86_400;
const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeyFormatError {
    #[error("expected 3 segments separated by '-', got {0}")]
    SegmentCount(usize),

    #[error("key must start with YOY")]
    Prefix,

    #[error("invalid year in key: {0}")]
    Year(String),
}

#[derive(Error, Debug)]
pub enum LicenseError {
    #[error("Invalid license format: {0}")]
    Format(#[from] KeyFormatError),

    #[error("Invalid license key")]
    Invalid,

    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: DatabaseError,
    },
}

/// Outcome of a well-formed key check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyValidation {
    pub valid: bool,
    pub year: i32,
}

// ─── Key engine ───────────────────────────────────────────────────────────────

/// Deterministic key derivation bound to one secret.
#[derive(Clone)]
pub struct KeyGenerator {
    secret: String,
}

impl std::fmt::Debug for KeyGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyGenerator").finish_non_exhaustive()
    }
}

impl KeyGenerator {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn generate_key(&self, year: i32) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(year.to_string().as_bytes());
        hasher.update(LICENSE_VERSION.as_bytes());
        let digest = hex::encode(hasher.finalize());

        format!(
            "{LICENSE_PREFIX}{year}{LICENSE_SEPARATOR}{}{LICENSE_SEPARATOR}{}",
            &digest[0..4],
            &digest[4..8]
        )
        .to_uppercase()
    }

    /// Case-insensitive; surrounding whitespace is ignored. Any integer year
    /// is accepted here, range policy belongs to the caller.
    pub fn validate_key(&self, key: &str) -> Result<KeyValidation, KeyFormatError> {
        let key = normalize_key(key);
        let parts: Vec<&str> = key.split(LICENSE_SEPARATOR).collect();
        if parts.len() != 3 {
            return Err(KeyFormatError::SegmentCount(parts.len()));
        }

        let year_part = parts[0]
            .strip_prefix(LICENSE_PREFIX)
            .ok_or(KeyFormatError::Prefix)?;
        let year: i32 = year_part
            .parse()
            .map_err(|_| KeyFormatError::Year(year_part.to_string()))?;

        Ok(KeyValidation {
            valid: key == self.generate_key(year),
            year,
        })
    }

    /// Same month and day one year later. Feb 29 lands on Feb 28.
    pub fn expiration_date(&self, activation: NaiveDateTime) -> NaiveDateTime {
        activation
            .checked_add_months(Months::new(UPDATE_WINDOW_MONTHS))
            .unwrap_or(NaiveDateTime::MAX)
    }
}

pub fn normalize_key(key: &str) -> String {
    key.trim().to_uppercase()
}

/// Whole days until expiration, rounded down. Negative once expired.
pub fn days_remaining(expires_at: NaiveDateTime, now: NaiveDateTime) -> i64 {
    (expires_at - now).num_seconds().div_euclid(SECONDS_PER_DAY)
}

pub fn license_status(expires_at: NaiveDateTime, now: NaiveDateTime) -> (LicenseTerm, i64) {
    let days = days_remaining(expires_at, now);
    let term = if now > expires_at {
        LicenseTerm::Expired
    } else if days <= EXPIRY_WARNING_DAYS {
        LicenseTerm::ExpiringSoon
    } else {
        LicenseTerm::Active
    };
    (term, days)
}

/// Visible license state for a stored record at `now`.
pub fn describe(record: &LicenseRecord, now: NaiveDateTime) -> LicenseInfo {
    let (term, days) = license_status(record.expires_at, now);
    let until = record.expires_at.format(DISPLAY_DATE_FORMAT);

    let (status, message) = match term {
        LicenseTerm::Active => (
            LicenseStatus::Active,
            format!("Licencia activa. Actualizaciones disponibles hasta {until} ({days} días restantes)"),
        ),
        LicenseTerm::ExpiringSoon => (
            LicenseStatus::Active,
            format!(
                "Su período de actualizaciones expira pronto ({days} días). El software seguirá funcionando."
            ),
        ),
        LicenseTerm::Expired => (
            LicenseStatus::Expired,
            format!(
                "Período de actualizaciones finalizado el {until}. El software sigue funcionando. \
                 Contacte soporte para renovar."
            ),
        ),
    };

    LicenseInfo {
        status,
        activated_at: Some(record.activated_at),
        expires_at: Some(record.expires_at),
        days_remaining: days,
        message,
    }
}

fn not_configured() -> LicenseInfo {
    LicenseInfo {
        status: LicenseStatus::NotConfigured,
        activated_at: None,
        expires_at: None,
        days_remaining: 0,
        message: "No hay licencia configurada. Por favor, active su licencia.".into(),
    }
}

// ─── Service ──────────────────────────────────────────────────────────────────

pub struct LicenseService {
    store: Arc<dyn LicenseStore>,
    generator: KeyGenerator,
    clock: Arc<dyn TimeSource>,
}

impl LicenseService {
    pub fn new(
        store: Arc<dyn LicenseStore>,
        generator: KeyGenerator,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            store,
            generator,
            clock,
        }
    }

    /// Validates `key`, then replaces any stored license with a fresh one
    /// activated now.
    pub fn validate_and_activate(&self, key: &str) -> Result<LicenseInfo, LicenseError> {
        let validation = self.generator.validate_key(key)?;
        if !validation.valid {
            tracing::warn!(year = validation.year, "License key rejected");
            return Err(LicenseError::Invalid);
        }

        let now = self.clock.now();
        let record = LicenseRecord {
            key: normalize_key(key),
            activated_at: now,
            expires_at: self.generator.expiration_date(now),
            active: true,
            version: format!("{}.0.0", validation.year),
        };
        self.store
            .save_license(&record)
            .map_err(|source| LicenseError::Store {
                context: "Error saving license",
                source,
            })?;

        tracing::info!(
            year = validation.year,
            expires_at = %record.expires_at,
            "License activated"
        );
        self.info()
    }

    pub fn info(&self) -> Result<LicenseInfo, LicenseError> {
        Ok(match self.load()? {
            Some(record) => describe(&record, self.clock.now()),
            None => not_configured(),
        })
    }

    /// True until a license has been stored.
    pub fn requires_activation(&self) -> Result<bool, LicenseError> {
        Ok(self.load()?.is_none())
    }

    /// A stored, active license whose update window is still open. The
    /// window closes at the expiration instant itself.
    pub fn has_active_license(&self) -> Result<bool, LicenseError> {
        Ok(self
            .load()?
            .is_some_and(|record| record.active && self.clock.now() < record.expires_at))
    }

    fn load(&self) -> Result<Option<LicenseRecord>, LicenseError> {
        self.store.get_license().map_err(|source| LicenseError::Store {
            context: "Error loading license",
            source,
        })
    }
}
