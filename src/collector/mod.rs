//! Key event collection.
//!
//! This module provides the platform-specific global key hooks, a replay hook
//! for recorded sessions, and the [`KeyHook`] seam the detector registers with.

pub mod hook;
#[cfg(any(target_os = "macos", target_os = "windows", test))]
pub mod keynames;
pub mod replay;
pub mod types;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub mod noop;

// Re-export commonly used types
pub use hook::{HookError, HookRegistration, KeyCallback, KeyHook};
pub use replay::ReplayCollector;
pub use types::{monotonic_seconds, KeyAction, KeyEvent, KeyId};

#[cfg(target_os = "macos")]
pub use macos::{check_permission, MacOSCollector};

/// Platform-agnostic collector type alias
#[cfg(target_os = "macos")]
pub type Collector = MacOSCollector;

#[cfg(target_os = "windows")]
pub use windows::{check_permission, WindowsCollector};

/// Platform-agnostic collector type alias
#[cfg(target_os = "windows")]
pub type Collector = WindowsCollector;

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub use noop::{check_permission, NoopCollector};

/// Platform-agnostic collector type alias
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub type Collector = NoopCollector;
