//! Ordered composition of rules.

use crate::core::EventBuffer;
use crate::rules::{EligibilityRule, Rule, RuleKind};

/// Outcome of running the whole chain over a buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutcome {
    pub passed: bool,
    /// Buffer as left by the last rule that ran
    pub buffer: EventBuffer,
    /// The rule that stopped the chain, if any
    pub rejected_by: Option<RuleKind>,
}

/// Rules evaluated in order, stopping at the first failure.
#[derive(Debug, Clone, Default)]
pub struct RuleChain {
    rules: Vec<Rule>,
}

impl RuleChain {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Append a rule to the end of the chain.
    pub fn with_rule(mut self, rule: impl Into<Rule>) -> Self {
        self.rules.push(rule.into());
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Thread the buffer through each rule in turn.
    ///
    /// An empty chain passes with the buffer unchanged.
    pub fn evaluate(&self, mut buffer: EventBuffer) -> ChainOutcome {
        for rule in &self.rules {
            let verdict = rule.evaluate(buffer);
            buffer = verdict.buffer;
            if !verdict.passed {
                return ChainOutcome {
                    passed: false,
                    buffer,
                    rejected_by: Some(rule.kind()),
                };
            }
        }

        ChainOutcome {
            passed: true,
            buffer,
            rejected_by: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::types::KeyEvent;
    use crate::core::KeyboardLayout;
    use crate::rules::{AdjacencyRule, SelfAdjacency, TimeWindowRule, UnreleasedCountRule};

    fn paw_chain() -> RuleChain {
        RuleChain::default()
            .with_rule(TimeWindowRule::new(0.05).unwrap())
            .with_rule(UnreleasedCountRule::new(3).unwrap())
            .with_rule(
                AdjacencyRule::new(&KeyboardLayout::qwerty(), 3, SelfAdjacency::Excluded)
                    .unwrap(),
            )
    }

    #[test]
    fn test_empty_chain_passes() {
        let buffer = EventBuffer::from(vec![KeyEvent::press("a", 0.0)]);
        let outcome = RuleChain::default().evaluate(buffer.clone());
        assert!(outcome.passed);
        assert_eq!(outcome.buffer, buffer);
        assert_eq!(outcome.rejected_by, None);
    }

    #[test]
    fn test_paw_passes() {
        let buffer = EventBuffer::from(vec![
            KeyEvent::press("s", 0.00),
            KeyEvent::press("d", 0.01),
            KeyEvent::press("e", 0.02),
        ]);
        let outcome = paw_chain().evaluate(buffer.clone());
        assert!(outcome.passed);
        assert_eq!(outcome.buffer, buffer);
    }

    #[test]
    fn test_first_failure_short_circuits() {
        // Slow typing: the time window keeps only the newest event and fails,
        // so the held-key rule never gets to trim the buffer.
        let buffer = EventBuffer::from(vec![
            KeyEvent::press("s", 0.0),
            KeyEvent::release("s", 0.5),
            KeyEvent::press("d", 1.0),
        ]);
        let outcome = paw_chain().evaluate(buffer);
        assert!(!outcome.passed);
        assert_eq!(outcome.rejected_by, Some(RuleKind::TimeWindow));
        assert_eq!(outcome.buffer.events(), &[KeyEvent::press("d", 1.0)]);
    }

    #[test]
    fn test_rejection_names_the_failing_rule() {
        let buffer = EventBuffer::from(vec![
            KeyEvent::press("q", 0.00),
            KeyEvent::press("p", 0.01),
            KeyEvent::press("m", 0.02),
        ]);
        let outcome = paw_chain().evaluate(buffer);
        assert!(!outcome.passed);
        assert_eq!(outcome.rejected_by, Some(RuleKind::Adjacency));
    }

    #[test]
    fn test_passed_buffer_passes_again() {
        let chain = paw_chain();
        let buffer = EventBuffer::from(vec![
            KeyEvent::press("a", 0.00),
            KeyEvent::press("z", 0.01),
            KeyEvent::release("a", 0.015),
            KeyEvent::press("s", 0.02),
            KeyEvent::press("x", 0.03),
        ]);

        let first = chain.evaluate(buffer);
        assert!(first.passed);
        let second = chain.evaluate(first.buffer.clone());
        assert_eq!(second.passed, first.passed);
        assert_eq!(second.buffer, first.buffer);
    }
}
