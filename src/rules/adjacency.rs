//! "All buffered keys are physically close to each other."

use crate::core::{AdjacencyIndex, EventBuffer, KeyboardLayout};
use crate::rules::{EligibilityRule, RuleError, RuleKind, Verdict};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Whether pairing an event with itself confirms it.
///
/// Every key is in its own neighborhood, so counting self-pairs lets any
/// buffer of known keys pass regardless of how far apart they are. `Counted`
/// is the long-standing behavior; `Excluded` requires each key to have a
/// distinct nearby partner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfAdjacency {
    #[default]
    Counted,
    Excluded,
}

/// Passes once every buffered event has been paired with a nearby event.
#[derive(Debug, Clone)]
pub struct AdjacencyRule {
    index: Arc<AdjacencyIndex>,
    self_adjacency: SelfAdjacency,
}

impl AdjacencyRule {
    pub fn new(
        layout: &KeyboardLayout,
        distance: usize,
        self_adjacency: SelfAdjacency,
    ) -> Result<Self, RuleError> {
        let index = AdjacencyIndex::new(layout, distance)?;
        Ok(Self::with_index(Arc::new(index), self_adjacency))
    }

    pub fn with_index(index: Arc<AdjacencyIndex>, self_adjacency: SelfAdjacency) -> Self {
        Self {
            index,
            self_adjacency,
        }
    }

    pub fn index(&self) -> &AdjacencyIndex {
        &self.index
    }

    pub fn self_adjacency(&self) -> SelfAdjacency {
        self.self_adjacency
    }
}

impl EligibilityRule for AdjacencyRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Adjacency
    }

    fn evaluate(&self, buffer: EventBuffer) -> Verdict {
        let events = buffer.events();
        let mut confirmed = vec![false; events.len()];
        let mut remaining = events.len();

        if remaining == 0 {
            return Verdict::fail(buffer);
        }

        for (i, event) in events.iter().enumerate() {
            let Some(near) = self.index.neighbors(&event.key) else {
                tracing::warn!(
                    key = %event.key,
                    table = ?self.index,
                    "No neighbors found for key; the keyboard layout is probably misconfigured"
                );
                continue;
            };

            for (j, other) in events.iter().enumerate() {
                if i == j && self.self_adjacency == SelfAdjacency::Excluded {
                    continue;
                }
                if !near.contains(&other.key) {
                    continue;
                }

                for position in [i, j] {
                    if !confirmed[position] {
                        confirmed[position] = true;
                        remaining -= 1;
                    }
                }
                if remaining == 0 {
                    return Verdict::pass(buffer);
                }
            }
        }

        Verdict::fail(buffer)
    }
}
