//! "All recent events happened within N seconds."

use crate::core::EventBuffer;
use crate::rules::{EligibilityRule, RuleError, RuleKind, Verdict};

/// Keeps the newest run of events whose accumulated gaps fit in the window.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeWindowRule {
    num_seconds: f64,
}

impl TimeWindowRule {
    pub fn new(num_seconds: f64) -> Result<Self, RuleError> {
        if !num_seconds.is_finite() || num_seconds <= 0.0 {
            return Err(RuleError::InvalidWindow(num_seconds));
        }
        Ok(Self { num_seconds })
    }

    pub fn num_seconds(&self) -> f64 {
        self.num_seconds
    }
}

impl EligibilityRule for TimeWindowRule {
    fn kind(&self) -> RuleKind {
        RuleKind::TimeWindow
    }

    fn evaluate(&self, mut buffer: EventBuffer) -> Verdict {
        if buffer.len() < 2 {
            return Verdict::pass(buffer);
        }

        // Walk newest to oldest, summing the gap between each pair.
        let events = buffer.events();
        let mut total = 0.0;
        let mut overflow_at = None;
        for newer in (1..events.len()).rev() {
            total += events[newer].timestamp - events[newer - 1].timestamp;
            if total > self.num_seconds {
                overflow_at = Some(newer);
                break;
            }
        }

        let Some(start) = overflow_at else {
            return Verdict::pass(buffer);
        };

        buffer.retain_from(start);
        // A lone event is not "several events within the window".
        if buffer.len() <= 1 {
            Verdict::fail(buffer)
        } else {
            Verdict::pass(buffer)
        }
    }
}
