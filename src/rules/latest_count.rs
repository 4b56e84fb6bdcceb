//! "Exactly the newest N events are analyzed."

use crate::core::EventBuffer;
use crate::rules::{EligibilityRule, RuleError, RuleKind, Verdict};

/// Fails until `num_events` events are buffered, then keeps only the newest
/// `num_events` so the buffer stays small.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestCountRule {
    num_events: usize,
}

impl LatestCountRule {
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

impl EligibilityRule for LatestCountRule {
    fn kind(&self) -> RuleKind {
        RuleKind::LatestCount
    }

    fn evaluate(&self, mut buffer: EventBuffer) -> Verdict {
        if buffer.len() < self.num_events {
            return Verdict::fail(buffer);
        }
        buffer.keep_newest(self.num_events);
        Verdict::pass(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::types::KeyEvent;

    #[test]
    fn test_too_few_events_fail_unchanged() {
        let rule = LatestCountRule::new(3).unwrap();
        let buffer = EventBuffer::from(vec![KeyEvent::press("a", 0.0), KeyEvent::press("b", 0.1)]);
        assert_eq!(rule.evaluate(buffer.clone()), Verdict::fail(buffer));
    }

    #[test]
    fn test_trims_to_newest() {
        let rule = LatestCountRule::new(2).unwrap();
        let buffer = EventBuffer::from(vec![
            KeyEvent::press("a", 0.0),
            KeyEvent::press("b", 0.1),
            KeyEvent::press("c", 0.2),
        ]);
        let verdict = rule.evaluate(buffer);
        assert!(verdict.passed);
        assert_eq!(
            verdict.buffer.events(),
            &[KeyEvent::press("b", 0.1), KeyEvent::press("c", 0.2)]
        );
    }

    #[test]
    fn test_rejects_zero() {
        assert_eq!(LatestCountRule::new(0), Err(RuleError::ZeroEventCount));
    }
}
