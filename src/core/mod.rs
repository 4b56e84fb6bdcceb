//! Core data model for paw detection.
//!
//! This module contains:
//! - Keyboard layouts (the physical key grid)
//! - The adjacency index precomputed from a layout
//! - The event buffer the rules operate on

pub mod adjacency;
pub mod buffer;
pub mod layout;

// Re-export commonly used types
pub use adjacency::{AdjacencyError, AdjacencyIndex};
pub use buffer::{EventBuffer, MAX_BUFFERED_EVENTS};
pub use layout::{KeyboardLayout, LayoutError, LayoutSource};
