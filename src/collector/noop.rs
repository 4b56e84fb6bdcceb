//! Fallback key hook for platforms without a global hook implementation.
//!
//! This exists so the crate (and binary) can compile on targets other than
//! macOS and Windows. It accepts registrations but never delivers events; use
//! the replay hook to exercise the detector on these platforms.

use crate::collector::hook::{HookError, HookRegistration, KeyCallback, KeyHook};

/// A hook that never emits events.
#[derive(Debug, Default)]
pub struct NoopCollector;

impl NoopCollector {
    pub fn new() -> Self {
        Self
    }
}

impl KeyHook for NoopCollector {
    fn register(&self, _callback: KeyCallback) -> Result<HookRegistration, HookError> {
        tracing::warn!("No global key hook on this platform; no key events will be observed");
        Ok(HookRegistration::inert())
    }
}

/// There is no Input Monitoring permission gate on these platforms.
pub fn check_permission() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_noop_registration() {
        let collector = NoopCollector::new();
        let registration = collector.register(Arc::new(|_| {})).unwrap();
        assert!(registration.release().is_ok());
    }
}
