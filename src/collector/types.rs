//! Key event types delivered by the collectors.
//!
//! A key is identified by its name when the platform can provide one, or by
//! its raw scan code otherwise. Never both.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use std::time::Instant;

/// Stable identity of a physical key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyId {
    /// Human-readable key name, e.g. `"a"` or `"caps lock"`
    Name(String),
    /// Raw scan code for keys the platform has no name for
    Code(u32),
}

impl KeyId {
    pub fn name(name: impl Into<String>) -> Self {
        KeyId::Name(name.into())
    }

    pub fn code(code: u32) -> Self {
        KeyId::Code(code)
    }

    /// Pick the name when one is available, falling back to the code.
    pub fn from_parts(name: Option<&str>, code: u32) -> Self {
        match name {
            Some(name) if !name.is_empty() => KeyId::name(name),
            _ => KeyId::Code(code),
        }
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyId::Name(name) => write!(f, "{name}"),
            KeyId::Code(code) => write!(f, "#{code}"),
        }
    }
}

impl From<&str> for KeyId {
    fn from(name: &str) -> Self {
        KeyId::name(name)
    }
}

impl From<u32> for KeyId {
    fn from(code: u32) -> Self {
        KeyId::Code(code)
    }
}

/// Whether a key went down or came back up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAction {
    Press,
    Release,
}

/// A single key transition as observed by a hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Which key changed state
    pub key: KeyId,
    /// Press or release
    pub action: KeyAction,
    /// Monotonic timestamp in seconds
    pub timestamp: f64,
}

impl KeyEvent {
    pub fn new(key: impl Into<KeyId>, action: KeyAction, timestamp: f64) -> Self {
        Self {
            key: key.into(),
            action,
            timestamp,
        }
    }

    pub fn press(key: impl Into<KeyId>, timestamp: f64) -> Self {
        Self::new(key, KeyAction::Press, timestamp)
    }

    pub fn release(key: impl Into<KeyId>, timestamp: f64) -> Self {
        Self::new(key, KeyAction::Release, timestamp)
    }

    /// Create an event stamped with the current monotonic time.
    pub fn now(key: impl Into<KeyId>, action: KeyAction) -> Self {
        Self::new(key, action, monotonic_seconds())
    }

    pub fn is_press(&self) -> bool {
        self.action == KeyAction::Press
    }
}

/// Seconds elapsed since the first call in this process.
pub fn monotonic_seconds() -> f64 {
    static ANCHOR: OnceLock<Instant> = OnceLock::new();
    ANCHOR.get_or_init(Instant::now).elapsed().as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_id_prefers_name() {
        assert_eq!(KeyId::from_parts(Some("a"), 0), KeyId::name("a"));
        assert_eq!(KeyId::from_parts(None, 54), KeyId::Code(54));
        assert_eq!(KeyId::from_parts(Some(""), 54), KeyId::Code(54));
    }

    #[test]
    fn test_key_id_json_is_untagged() {
        let ids: Vec<KeyId> = serde_json::from_str(r#"["esc", 179]"#).unwrap();
        assert_eq!(ids, vec![KeyId::name("esc"), KeyId::Code(179)]);
    }

    #[test]
    fn test_key_event_json_format() {
        let event: KeyEvent =
            serde_json::from_str(r#"{"key":"q","action":"press","timestamp":1.5}"#).unwrap();
        assert_eq!(event, KeyEvent::press("q", 1.5));
        assert!(event.is_press());
    }

    #[test]
    fn test_monotonic_seconds_never_decreases() {
        let a = monotonic_seconds();
        let b = monotonic_seconds();
        assert!(b >= a);
    }
}
