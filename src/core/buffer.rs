//! The ordered buffer of recent key events.

use crate::collector::types::KeyEvent;

/// Most events a buffer holds; pushing past this drops the oldest.
pub const MAX_BUFFERED_EVENTS: usize = 64;

/// Chronologically ordered key events awaiting evaluation.
///
/// Events are appended by the detector and trimmed by rules. Rules may drop
/// events or replace the buffer with a sorted subsequence, never reorder it.
/// The length never exceeds [`MAX_BUFFERED_EVENTS`], whatever the rules do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventBuffer {
    events: Vec<KeyEvent>,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event at the newest end.
    ///
    /// Hooks deliver monotonic timestamps, so an older timestamp points at a
    /// misbehaving hook. The event is kept but reported.
    pub fn push(&mut self, event: KeyEvent) {
        if let Some(newest) = self.events.last() {
            if event.timestamp < newest.timestamp {
                tracing::warn!(
                    key = %event.key,
                    timestamp = event.timestamp,
                    newest = newest.timestamp,
                    "Key event arrived out of order"
                );
            }
        }
        self.events.push(event);

        if self.events.len() > MAX_BUFFERED_EVENTS {
            let excess = self.events.len() - MAX_BUFFERED_EVENTS;
            tracing::debug!(dropped = excess, "Event buffer full; dropping oldest events");
            self.events.drain(..excess);
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[KeyEvent] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, KeyEvent> {
        self.events.iter()
    }

    pub fn newest(&self) -> Option<&KeyEvent> {
        self.events.last()
    }

    /// Drop every event before `start`.
    pub fn retain_from(&mut self, start: usize) {
        let start = start.min(self.events.len());
        self.events.drain(..start);
    }

    /// Keep only the newest `count` events.
    pub fn keep_newest(&mut self, count: usize) {
        let excess = self.events.len().saturating_sub(count);
        self.retain_from(excess);
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

}

impl From<Vec<KeyEvent>> for EventBuffer {
    fn from(events: Vec<KeyEvent>) -> Self {
        Self { events }
    }
}

impl FromIterator<KeyEvent> for EventBuffer {
    fn from_iter<I: IntoIterator<Item = KeyEvent>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a EventBuffer {
    type Item = &'a KeyEvent;
    type IntoIter = std::slice::Iter<'a, KeyEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl IntoIterator for EventBuffer {
    type Item = KeyEvent;
    type IntoIter = std::vec::IntoIter<KeyEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presses(times: &[f64]) -> EventBuffer {
        times
            .iter()
            .enumerate()
            .map(|(i, t)| KeyEvent::press(format!("k{i}").as_str(), *t))
            .collect()
    }

    #[test]
    fn test_push_and_newest() {
        let mut buffer = EventBuffer::new();
        assert!(buffer.newest().is_none());
        buffer.push(KeyEvent::press("a", 0.0));
        buffer.push(KeyEvent::press("b", 0.1));
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.newest(), Some(&KeyEvent::press("b", 0.1)));
    }

    #[test]
    fn test_out_of_order_push_is_kept() {
        let mut buffer = EventBuffer::new();
        buffer.push(KeyEvent::press("a", 1.0));
        buffer.push(KeyEvent::press("b", 0.5));
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_push_drops_oldest_past_capacity() {
        let mut buffer = EventBuffer::new();
        for i in 0..MAX_BUFFERED_EVENTS + 10 {
            buffer.push(KeyEvent::press("a", i as f64));
        }
        assert_eq!(buffer.len(), MAX_BUFFERED_EVENTS);
        assert_eq!(buffer.events()[0].timestamp, 10.0);
        assert_eq!(
            buffer.newest().map(|e| e.timestamp),
            Some((MAX_BUFFERED_EVENTS + 9) as f64)
        );
    }

    #[test]
    fn test_retain_from_keeps_suffix() {
        let mut buffer = presses(&[0.0, 0.1, 0.2, 0.3]);
        buffer.retain_from(2);
        let times: Vec<f64> = buffer.iter().map(|e| e.timestamp).collect();
        assert_eq!(times, vec![0.2, 0.3]);

        buffer.retain_from(10);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_keep_newest() {
        let mut buffer = presses(&[0.0, 0.1, 0.2]);
        buffer.keep_newest(5);
        assert_eq!(buffer.len(), 3);
        buffer.keep_newest(1);
        assert_eq!(buffer.events(), &[KeyEvent::press("k2", 0.2)]);
    }
}
