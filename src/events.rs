//! UI notifications. The desktop shell subscribes to named events; the core
//! only emits them and never waits on a listener.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

pub const APPOINTMENT_STATE_CHANGED: &str = "appointment-state-changed";
pub const APPOINTMENT_SAVED: &str = "appointment-saved";
pub const APPOINTMENT_DELETED: &str = "appointment-deleted";
pub const PATIENT_SAVED: &str = "patient-saved";
pub const PATIENT_DELETED: &str = "patient-deleted";
pub const SETTINGS_SAVED: &str = "settings-saved";
pub const LICENSE_ACTIVATED: &str = "license-activated";

/// Default bound for `ChannelEventSink` queues.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiEvent {
    pub name: String,
    pub payload: Value,
}

/// Receiver of UI events. Emission is fire-and-forget.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &str, payload: Value);
}

/// Logs every event at debug level. Used when no UI is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &str, payload: Value) {
        tracing::debug!(event, %payload, "UI event");
    }
}

/// Forwards events into a bounded channel. A full or closed channel drops
/// the event with a warning.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    tx: mpsc::Sender<UiEvent>,
}

impl ChannelEventSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<UiEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: &str, payload: Value) {
        let msg = UiEvent {
            name: event.to_string(),
            payload,
        };
        match self.tx.try_send(msg) {
            Ok(()) => (),
            Err(mpsc::error::TrySendError::Full(msg)) => {
                tracing::warn!(event = %msg.name, "UI event queue full, event dropped");
            }
            Err(mpsc::error::TrySendError::Closed(msg)) => {
                tracing::warn!(event = %msg.name, "UI event listener gone, event dropped");
            }
        }
    }
}
