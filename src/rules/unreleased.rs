//! "At least K keys are currently held down."

use crate::collector::types::{KeyEvent, KeyId};
use crate::core::EventBuffer;
use crate::rules::{EligibilityRule, RuleError, RuleKind, Verdict};
use indexmap::IndexMap;

/// Reduces the buffer to the newest `num_events` keys that are still pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreleasedCountRule {
    num_events: usize,
}

impl UnreleasedCountRule {
    pub fn new(num_events: usize) -> Result<Self, RuleError> {
        if num_events == 0 {
            return Err(RuleError::ZeroEventCount);
        }
        Ok(Self { num_events })
    }

    pub fn num_events(&self) -> usize {
        self.num_events
    }
}

impl EligibilityRule for UnreleasedCountRule {
    fn kind(&self) -> RuleKind {
        RuleKind::UnreleasedCount
    }

    fn evaluate(&self, buffer: EventBuffer) -> Verdict {
        // Latest state per key. Overwriting keeps the key's first position.
        let mut latest: IndexMap<KeyId, KeyEvent> = IndexMap::new();
        for event in buffer {
            latest.insert(event.key.clone(), event);
        }

        let mut held: Vec<KeyEvent> = latest
            .into_values()
            .filter(KeyEvent::is_press)
            .collect();
        held.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

        let mut held = EventBuffer::from(held);
        held.keep_newest(self.num_events);

        if held.len() >= self.num_events {
            Verdict::pass(held)
        } else {
            Verdict::fail(held)
        }
    }
}
