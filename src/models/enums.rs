use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The wire string doubles as the serde name and the stored column value.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(AppointmentState {
    Pending => "pendiente",
    Confirmed => "confirmado",
    Attended => "atendido",
    Absent => "ausente",
    Cancelled => "cancelado",
});

impl AppointmentState {
    /// Still expected to happen today: counts as pending on the agenda.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Contributes to the lateness estimate when its slot has passed.
    pub fn counts_toward_delay(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::Attended)
    }
}

// Externally visible license state
str_enum!(LicenseStatus {
    Active => "activa",
    Expired => "expirada",
    NotConfigured => "no_configurada",
});

// Engine-level tier; ExpiringSoon still gates as active
str_enum!(LicenseTerm {
    Active => "activa",
    ExpiringSoon => "por_expirar",
    Expired => "expirada",
});

str_enum!(MessageKind {
    Confirmation => "confirmacion",
    Reminder => "recordatorio",
    Delay => "demora",
});

str_enum!(DelayTier {
    OnTime => "on_time",
    Minor => "minor",
    Major => "major",
});
