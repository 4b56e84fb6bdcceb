//! Replays recorded key events from a JSON-lines file.
//!
//! Each non-empty line holds one [`KeyEvent`]:
//!
//! ```text
//! {"key":"q","action":"press","timestamp":0.000}
//! {"key":"w","action":"press","timestamp":0.010}
//! ```
//!
//! The replay hook delivers the events on a background thread as fast as the
//! callback accepts them; the recorded timestamps are passed through as-is.

use crate::collector::hook::{HookError, HookRegistration, KeyCallback, KeyHook};
use crate::collector::types::KeyEvent;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// A hook backed by a fixed list of events.
#[derive(Debug, Clone, Default)]
pub struct ReplayCollector {
    events: Vec<KeyEvent>,
}

impl ReplayCollector {
    pub fn new(events: Vec<KeyEvent>) -> Self {
        Self { events }
    }

    /// Load events from a JSON-lines file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, HookError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map(Self::new)
    }

    /// Parse JSON-lines content. Blank lines and lines starting with `#` are skipped.
    pub fn parse(content: &str) -> Result<Vec<KeyEvent>, HookError> {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with('#')
            })
            .map(|(index, line)| {
                serde_json::from_str(line).map_err(|e| HookError::Parse {
                    line: index + 1,
                    message: e.to_string(),
                })
            })
            .collect()
    }

    pub fn events(&self) -> &[KeyEvent] {
        &self.events
    }
}

impl KeyHook for ReplayCollector {
    fn register(&self, callback: KeyCallback) -> Result<HookRegistration, HookError> {
        let events = self.events.clone();
        let running = Arc::new(AtomicBool::new(true));

        let thread_running = running.clone();
        let handle = thread::Builder::new()
            .name("paws-replay".into())
            .spawn(move || {
                for event in events {
                    if !thread_running.load(Ordering::SeqCst) {
                        break;
                    }
                    callback(event);
                }
            })?;

        Ok(HookRegistration::new(move || {
            running.store(false, Ordering::SeqCst);
            handle.join().map_err(|_| HookError::ThreadPanicked)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_parse_skips_blank_and_comment_lines() {
        let content = "# recorded on a desk\n\
                       {\"key\":\"q\",\"action\":\"press\",\"timestamp\":0.0}\n\
                       \n\
                       {\"key\":54,\"action\":\"release\",\"timestamp\":0.5}\n";
        let events = ReplayCollector::parse(content).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], KeyEvent::press("q", 0.0));
        assert_eq!(events[1], KeyEvent::release(54u32, 0.5));
    }

    #[test]
    fn test_parse_reports_line_number() {
        let content = "{\"key\":\"q\",\"action\":\"press\",\"timestamp\":0.0}\nnot json\n";
        match ReplayCollector::parse(content) {
            Err(HookError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_replay_delivers_all_events_in_order() {
        let events = vec![
            KeyEvent::press("a", 0.0),
            KeyEvent::press("s", 0.01),
            KeyEvent::release("a", 0.02),
        ];
        let collector = ReplayCollector::new(events.clone());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let registration = collector
            .register(Arc::new(move |event| sink.lock().unwrap().push(event)))
            .unwrap();

        // Wait for the replay thread to drain before releasing.
        while seen.lock().unwrap().len() < events.len() {
            thread::yield_now();
        }
        registration.release().unwrap();

        assert_eq!(*seen.lock().unwrap(), events);
    }
}
