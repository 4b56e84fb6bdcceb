//! Eligibility rules.
//!
//! A rule takes ownership of the event buffer, decides whether it still looks
//! like a paw, and hands back a (possibly trimmed) buffer for the next rule.
//! The set of rules is closed: every variant lives in [`Rule`].

pub mod adjacency;
pub mod chain;
pub mod latest_count;
pub mod time_window;
pub mod unreleased;

pub use adjacency::{AdjacencyRule, SelfAdjacency};
pub use chain::{ChainOutcome, RuleChain};
pub use latest_count::LatestCountRule;
pub use time_window::TimeWindowRule;
pub use unreleased::UnreleasedCountRule;

use crate::core::{AdjacencyError, EventBuffer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when constructing a rule.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    #[error("Time window must be a positive number of seconds, got {0}")]
    InvalidWindow(f64),
    #[error("Event count must be at least 1")]
    ZeroEventCount,
    #[error(transparent)]
    Adjacency(#[from] AdjacencyError),
}

/// Result of evaluating one rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub passed: bool,
    /// Buffer handed to the next rule, and kept for the next event
    pub buffer: EventBuffer,
}

impl Verdict {
    pub fn pass(buffer: EventBuffer) -> Self {
        Self {
            passed: true,
            buffer,
        }
    }

    pub fn fail(buffer: EventBuffer) -> Self {
        Self {
            passed: false,
            buffer,
        }
    }
}

/// Identifies a rule variant, e.g. in rejection counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    TimeWindow,
    UnreleasedCount,
    Adjacency,
    LatestCount,
}

impl RuleKind {
    pub const ALL: [RuleKind; 4] = [
        RuleKind::TimeWindow,
        RuleKind::UnreleasedCount,
        RuleKind::Adjacency,
        RuleKind::LatestCount,
    ];

    /// Position in [`RuleKind::ALL`].
    pub fn index(self) -> usize {
        match self {
            RuleKind::TimeWindow => 0,
            RuleKind::UnreleasedCount => 1,
            RuleKind::Adjacency => 2,
            RuleKind::LatestCount => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::TimeWindow => "time_window",
            RuleKind::UnreleasedCount => "unreleased_count",
            RuleKind::Adjacency => "adjacency",
            RuleKind::LatestCount => "latest_count",
        }
    }
}

/// The single capability every rule provides.
pub trait EligibilityRule {
    fn kind(&self) -> RuleKind;

    /// Evaluate the buffer. Must not panic; inconsistent input fails closed.
    fn evaluate(&self, buffer: EventBuffer) -> Verdict;
}

/// Every supported rule.
#[derive(Debug, Clone)]
pub enum Rule {
    TimeWindow(TimeWindowRule),
    UnreleasedCount(UnreleasedCountRule),
    Adjacency(AdjacencyRule),
    LatestCount(LatestCountRule),
}

impl EligibilityRule for Rule {
    fn kind(&self) -> RuleKind {
        match self {
            Rule::TimeWindow(rule) => rule.kind(),
            Rule::UnreleasedCount(rule) => rule.kind(),
            Rule::Adjacency(rule) => rule.kind(),
            Rule::LatestCount(rule) => rule.kind(),
        }
    }

    fn evaluate(&self, buffer: EventBuffer) -> Verdict {
        match self {
            Rule::TimeWindow(rule) => rule.evaluate(buffer),
            Rule::UnreleasedCount(rule) => rule.evaluate(buffer),
            Rule::Adjacency(rule) => rule.evaluate(buffer),
            Rule::LatestCount(rule) => rule.evaluate(buffer),
        }
    }
}

impl From<TimeWindowRule> for Rule {
    fn from(rule: TimeWindowRule) -> Self {
        Rule::TimeWindow(rule)
    }
}

impl From<UnreleasedCountRule> for Rule {
    fn from(rule: UnreleasedCountRule) -> Self {
        Rule::UnreleasedCount(rule)
    }
}

impl From<AdjacencyRule> for Rule {
    fn from(rule: AdjacencyRule) -> Self {
        Rule::Adjacency(rule)
    }
}

impl From<LatestCountRule> for Rule {
    fn from(rule: LatestCountRule) -> Self {
        Rule::LatestCount(rule)
    }
}
