//! Content-free detection statistics.
//!
//! Counts how many events were evaluated, how many paws were detected and
//! which rule rejected the rest. Keys are never recorded.

use crate::rules::RuleKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Detection statistics for the current session.
#[derive(Debug)]
pub struct TransparencyLog {
    /// Number of key events evaluated
    key_events: AtomicU64,
    /// Number of times every rule passed
    detections: AtomicU64,
    /// Rejections, indexed by `RuleKind::index`
    rejections: [AtomicU64; 4],
    /// Largest buffer seen after appending an event
    max_buffer_len: AtomicU64,
    session_start: DateTime<Utc>,
    persist_path: Option<PathBuf>,
}

impl TransparencyLog {
    pub fn new() -> Self {
        Self {
            key_events: AtomicU64::new(0),
            detections: AtomicU64::new(0),
            rejections: Default::default(),
            max_buffer_len: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a log that loads from, and saves to, `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!(error = %e, "Could not load previous transparency stats");
        }

        log
    }

    pub fn record_key_event(&self) {
        self.key_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_detection(&self) {
        self.detections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self, kind: RuleKind) {
        self.rejections[kind.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_buffer_len(&self, len: usize) {
        self.max_buffer_len.fetch_max(len as u64, Ordering::Relaxed);
    }

    pub fn stats(&self) -> TransparencyStats {
        let rejections = RuleKind::ALL
            .iter()
            .map(|kind| (*kind, self.rejections[kind.index()].load(Ordering::Relaxed)))
            .filter(|(_, count)| *count > 0)
            .collect();

        TransparencyStats {
            key_events: self.key_events.load(Ordering::Relaxed),
            detections: self.detections.load(Ordering::Relaxed),
            rejections,
            max_buffer_len: self.max_buffer_len.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        let mut rejections = String::new();
        for kind in RuleKind::ALL {
            let count = stats.rejections.get(&kind).copied().unwrap_or(0);
            rejections.push_str(&format!("\n   - {}: {}", kind.as_str(), count));
        }

        format!(
            "Session Statistics:\n\
             - Key events evaluated: {}\n\
             - Paws detected: {}\n\
             - Rejections by rule:{}\n\
             - Largest buffer: {} events\n\
             - Session duration: {} seconds\n\
             \n\
             Privacy Guarantee:\n\
             - Only the last few key events are held, in memory\n\
             - No keystrokes written to disk or sent anywhere\n\
             - Only the counts above are persisted",
            stats.key_events,
            stats.detections,
            rejections,
            stats.max_buffer_len,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk. Does nothing without a persistence path.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                key_events: stats.key_events,
                detections: stats.detections,
                rejections: stats.rejections,
                max_buffer_len: stats.max_buffer_len,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.key_events
                    .store(persisted.key_events, Ordering::Relaxed);
                self.detections
                    .store(persisted.detections, Ordering::Relaxed);
                for (kind, count) in persisted.rejections {
                    self.rejections[kind.index()].store(count, Ordering::Relaxed);
                }
                self.max_buffer_len
                    .store(persisted.max_buffer_len, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    pub fn reset(&self) {
        self.key_events.store(0, Ordering::Relaxed);
        self.detections.store(0, Ordering::Relaxed);
        for counter in &self.rejections {
            counter.store(0, Ordering::Relaxed);
        }
        self.max_buffer_len.store(0, Ordering::Relaxed);
    }
}

impl Default for TransparencyLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of transparency statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransparencyStats {
    pub key_events: u64,
    pub detections: u64,
    /// Rules that rejected at least one event
    pub rejections: BTreeMap<RuleKind, u64>,
    pub max_buffer_len: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    key_events: u64,
    detections: u64,
    #[serde(default)]
    rejections: BTreeMap<RuleKind, u64>,
    #[serde(default)]
    max_buffer_len: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared transparency log.
pub type SharedTransparencyLog = Arc<TransparencyLog>;

pub fn create_shared_log() -> SharedTransparencyLog {
    Arc::new(TransparencyLog::new())
}

pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedTransparencyLog {
    Arc::new(TransparencyLog::with_persistence(path))
}
