//! Paws - locks your session when a cat walks across the keyboard.
//!
//! Every key event is appended to a short buffer and run through a chain of
//! eligibility rules. When several adjacent keys are held down within a few
//! milliseconds of each other, the chain passes and a configured action
//! (normally a session lock) runs.
//!
//! # Privacy Guarantees
//!
//! - **Short memory**: Only the handful of events the rules still need are held
//! - **In memory only**: Keystrokes are never persisted; warnings name a key only
//!   when it is missing from the layout or arrives out of order
//! - **Local**: Nothing is sent anywhere
//! - **Transparency**: Only content-free counters are persisted
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                             Paws                             │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────────────┐ │
//! │  │  Key hook   │──▶│ EventBuffer │──▶│ RuleChain           │ │
//! │  │ (platform)  │   │  (Mutex)    │   │ window ▶ held ▶ near│ │
//! │  └─────────────┘   └─────────────┘   └─────────────────────┘ │
//! │                                                 │            │
//! │         ┌───────────────────────────────────────┤            │
//! │         ▼                                       ▼            │
//! │  ┌─────────────┐                         ┌─────────────┐     │
//! │  │Transparency │                         │ Lock action │     │
//! │  │    Log      │                         │  (command)  │     │
//! │  └─────────────┘                         └─────────────┘     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use paws::{collector::Collector, config::Config, Detector};
//!
//! let config = Config::default();
//! let chain = config.build_chain().expect("invalid rules");
//!
//! // Requires Input Monitoring permission on macOS
//! let mut detector = Detector::new(Collector::new(), chain, || println!("paw!"));
//! detector.start().expect("Failed to register key hook");
//! ```

pub mod actions;
pub mod collector;
pub mod config;
pub mod core;
pub mod detector;
pub mod logging;
pub mod rules;
pub mod transparency;

// Re-export key types at crate root for convenience
pub use actions::{ActionError, LockAction};
pub use collector::{Collector, HookError, HookRegistration, KeyEvent, KeyHook, KeyId};
pub use config::{Config, ConfigError, RuleSpec};
pub use core::{AdjacencyIndex, EventBuffer, KeyboardLayout, LayoutSource};
pub use detector::{Detector, DetectorError, DetectorState};
pub use rules::{EligibilityRule, Rule, RuleChain, RuleError, RuleKind};
pub use transparency::{SharedTransparencyLog, TransparencyLog, TransparencyStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Privacy declaration that can be displayed to users.
pub const PRIVACY_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║                   PAWS - PRIVACY DECLARATION                     ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  Paws watches key presses to notice a cat on the keyboard.       ║
║                                                                  ║
║  ✓ WHAT WE KEEP, IN MEMORY ONLY:                                 ║
║    • The last few key events (which key, press or release,       ║
║      and when), usually fewer than a dozen                       ║
║    • Events older than the detection window are dropped at       ║
║      the next key press                                          ║
║                                                                  ║
║  ✗ WHAT WE NEVER DO:                                             ║
║    • Write keys you press to disk (no passwords, messages)       ║
║    • Send anything over the network                              ║
║    • Look at applications, windows or screen content             ║
║                                                                  ║
║  The only thing saved is a set of counters: events seen,         ║
║  paws detected, and which rule rejected the rest.                ║
║                                                                  ║
║  You can view these statistics anytime with:                     ║
║    paws status                                                   ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privacy_declaration_contents() {
        assert!(PRIVACY_DECLARATION.contains("PRIVACY"));
        assert!(PRIVACY_DECLARATION.contains("NEVER DO"));
        assert!(PRIVACY_DECLARATION.contains("paws status"));
    }
}
