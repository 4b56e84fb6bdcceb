//! The seam between platform key hooks and the detector.
//!
//! A hook accepts a callback and hands back a [`HookRegistration`]. Releasing
//! the registration removes the callback; this happens exactly once, either
//! through [`HookRegistration::release`] or when the registration is dropped.

use crate::collector::types::KeyEvent;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Callback invoked by a hook for every key transition.
pub type KeyCallback = Arc<dyn Fn(KeyEvent) + Send + Sync>;

/// Errors raised while installing or removing a key hook.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("Input Monitoring permission not granted")]
    PermissionDenied,
    #[error("Failed to create CGEvent tap")]
    TapCreationFailed,
    #[error("Failed to create run loop source")]
    RunLoopSourceFailed,
    #[error("Failed to install Windows hook")]
    HookInstallationFailed,
    #[error("Hook thread exited before reporting its status")]
    ThreadExited,
    #[error("Hook thread panicked")]
    ThreadPanicked,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// A source of key events that can deliver them to a callback.
pub trait KeyHook {
    /// Install `callback`. Events flow until the returned registration is
    /// released or dropped.
    fn register(&self, callback: KeyCallback) -> Result<HookRegistration, HookError>;
}

type ReleaseFn = Box<dyn FnOnce() -> Result<(), HookError> + Send>;

/// Handle to an installed callback.
pub struct HookRegistration {
    release: Option<ReleaseFn>,
}

impl HookRegistration {
    pub fn new(release: impl FnOnce() -> Result<(), HookError> + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A registration with nothing to tear down.
    pub fn inert() -> Self {
        Self::new(|| Ok(()))
    }

    /// Remove the callback from the hook.
    pub fn release(mut self) -> Result<(), HookError> {
        match self.release.take() {
            Some(release) => release(),
            None => Ok(()),
        }
    }
}

impl Drop for HookRegistration {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            if let Err(e) = release() {
                tracing::warn!(error = %e, "Failed to release key hook on drop");
            }
        }
    }
}

impl fmt::Debug for HookRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistration")
            .field("active", &self.release.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_registration(count: &Arc<AtomicUsize>) -> HookRegistration {
        let count = count.clone();
        HookRegistration::new(move || {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn test_release_runs_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let registration = counting_registration(&count);
        registration.release().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_releases() {
        let count = Arc::new(AtomicUsize::new(0));
        {
            let _registration = counting_registration(&count);
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_error_is_returned() {
        let registration = HookRegistration::new(|| Err(HookError::ThreadPanicked));
        assert!(matches!(
            registration.release(),
            Err(HookError::ThreadPanicked)
        ));
    }
}
