//! Transparency module for Paws.
//!
//! This module tracks what the detector has seen and done, as counts only,
//! so users can verify that no keystroke content outlives the buffer.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, SharedTransparencyLog, TransparencyLog,
    TransparencyStats,
};
