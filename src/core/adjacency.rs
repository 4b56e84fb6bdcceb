//! Precomputed key neighborhoods.
//!
//! For every key on a layout, the index stores the set of keys inside a
//! `distance × distance` square centred on it (top-left corner offset by
//! `distance / 2`), clipped to the grid. The set always contains the key
//! itself.
//!
//! Duplicate identifiers are not supported: when a key occupies several
//! cells, only the neighborhood of the last cell in row-major order is kept.

use crate::collector::types::KeyId;
use crate::core::layout::KeyboardLayout;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors raised when building an adjacency index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdjacencyError {
    #[error("Neighborhood distance must be at least 1")]
    ZeroDistance,
}

/// Immutable mapping from a key to its neighborhood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacencyIndex {
    distance: usize,
    neighbors: HashMap<KeyId, HashSet<KeyId>>,
}

impl AdjacencyIndex {
    /// Build the index for `layout` with the given neighborhood size.
    pub fn new(layout: &KeyboardLayout, distance: usize) -> Result<Self, AdjacencyError> {
        if distance == 0 {
            return Err(AdjacencyError::ZeroDistance);
        }
        Ok(Self::build(layout, distance))
    }

    fn build(layout: &KeyboardLayout, distance: usize) -> Self {
        let mut neighbors: HashMap<KeyId, HashSet<KeyId>> = HashMap::new();
        let mut duplicates: HashSet<&KeyId> = HashSet::new();

        for (row, col, key) in layout.cells() {
            let neighborhood = neighborhood(layout, row, col, distance);
            if neighbors.insert(key.clone(), neighborhood).is_some() {
                duplicates.insert(key);
            }
        }

        if !duplicates.is_empty() {
            tracing::debug!(
                keys = ?duplicates,
                "Layout lists keys in several cells; keeping the last cell's neighborhood"
            );
        }

        Self {
            distance,
            neighbors,
        }
    }

    /// Neighborhood of `key`, or `None` if the layout does not contain it.
    pub fn neighbors(&self, key: &KeyId) -> Option<&HashSet<KeyId>> {
        self.neighbors.get(key)
    }

    pub fn contains(&self, key: &KeyId) -> bool {
        self.neighbors.contains_key(key)
    }

    /// Whether `other` lies in the neighborhood of `key`.
    pub fn is_near(&self, key: &KeyId, other: &KeyId) -> bool {
        self.neighbors(key)
            .map(|set| set.contains(other))
            .unwrap_or(false)
    }

    pub fn distance(&self) -> usize {
        self.distance
    }

    /// Number of distinct keys in the index.
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}

/// Keys inside the square window anchored at `(row, col)`.
fn neighborhood(
    layout: &KeyboardLayout,
    row: usize,
    col: usize,
    distance: usize,
) -> HashSet<KeyId> {
    let offset = (distance / 2) as isize;
    let top = row as isize - offset;
    let left = col as isize - offset;

    let mut keys = HashSet::new();
    for i in 0..distance as isize {
        let r = top + i;
        if r < 0 || r as usize >= layout.row_count() {
            continue;
        }
        for j in 0..distance as isize {
            let c = left + j;
            if c < 0 || c as usize >= layout.column_count() {
                continue;
            }
            if let Some(key) = layout.get(r as usize, c as usize) {
                keys.insert(key.clone());
            }
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(rows: &[&[&str]]) -> KeyboardLayout {
        KeyboardLayout::new(
            rows.iter()
                .map(|row| {
                    row.iter()
                        .map(|k| (!k.is_empty()).then(|| KeyId::name(*k)))
                        .collect()
                })
                .collect(),
        )
        .unwrap()
    }

    fn set(keys: &[&str]) -> HashSet<KeyId> {
        keys.iter().map(|k| KeyId::name(*k)).collect()
    }

    #[test]
    fn test_zero_distance_is_rejected() {
        let err = AdjacencyIndex::new(&KeyboardLayout::qwerty(), 0).unwrap_err();
        assert_eq!(err, AdjacencyError::ZeroDistance);
    }

    #[test]
    fn test_distance_one_is_self_only() {
        let index = AdjacencyIndex::build(&layout(&[&["x", "y", "z"]]), 1);
        assert_eq!(index.neighbors(&KeyId::name("y")), Some(&set(&["y"])));
    }

    #[test]
    fn test_distance_three_is_chebyshev_one() {
        let grid = layout(&[&["a", "b", "c"], &["d", "e", "f"], &["g", "h", "i"]]);
        let index = AdjacencyIndex::build(&grid, 3);

        let all = set(&["a", "b", "c", "d", "e", "f", "g", "h", "i"]);
        assert_eq!(index.neighbors(&KeyId::name("e")), Some(&all));

        // Corners are clipped to the grid, not wrapped.
        assert_eq!(
            index.neighbors(&KeyId::name("a")),
            Some(&set(&["a", "b", "d", "e"]))
        );
        assert!(!index.is_near(&KeyId::name("a"), &KeyId::name("i")));
    }

    #[test]
    fn test_even_distance_extends_up_and_left() {
        let index = AdjacencyIndex::build(&layout(&[&["w", "x", "y", "z"]]), 2);
        // Offset is distance / 2 = 1, so the window covers [col - 1, col].
        assert_eq!(index.neighbors(&KeyId::name("y")), Some(&set(&["x", "y"])));
        assert_eq!(index.neighbors(&KeyId::name("w")), Some(&set(&["w"])));
    }

    #[test]
    fn test_empty_cells_are_never_neighbors() {
        let index = AdjacencyIndex::build(&layout(&[&["x", "", "z"]]), 3);
        assert_eq!(index.len(), 2);
        assert_eq!(index.neighbors(&KeyId::name("x")), Some(&set(&["x"])));
    }

    #[test]
    fn test_duplicate_key_keeps_last_cell() {
        let index = AdjacencyIndex::build(&layout(&[&["k", "a", "b", "c", "k"]]), 3);
        assert_eq!(index.neighbors(&KeyId::name("k")), Some(&set(&["c", "k"])));
        assert!(!index.is_near(&KeyId::name("k"), &KeyId::name("a")));
    }

    #[test]
    fn test_unknown_key() {
        let index = AdjacencyIndex::build(&KeyboardLayout::qwerty(), 3);
        assert!(index.neighbors(&KeyId::name("f13")).is_none());
        assert!(index.contains(&KeyId::Code(54)));
    }

    #[test]
    fn test_qwerty_home_row() {
        let index = AdjacencyIndex::build(&KeyboardLayout::qwerty(), 3);
        assert!(index.is_near(&KeyId::name("s"), &KeyId::name("w")));
        assert!(index.is_near(&KeyId::name("s"), &KeyId::name("x")));
        assert!(!index.is_near(&KeyId::name("s"), &KeyId::name("g")));
    }
}
