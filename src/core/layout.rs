//! Physical keyboard layouts.
//!
//! A layout is a rectangular grid of key identifiers. Empty cells are explicit
//! placeholders and never match any key. Keys that span several cells (shift,
//! space) are listed once per cell they cover.

use crate::collector::types::KeyId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when constructing a layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("Layout has no keys")]
    Empty,
    #[error("Layout row {row} has {found} cells, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Immutable grid of key identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardLayout {
    rows: Vec<Vec<Option<KeyId>>>,
    width: usize,
}

impl KeyboardLayout {
    /// Build a layout, checking that it is non-empty and rectangular.
    pub fn new(rows: Vec<Vec<Option<KeyId>>>) -> Result<Self, LayoutError> {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if width == 0 {
            return Err(LayoutError::Empty);
        }

        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != width {
                return Err(LayoutError::RaggedRows {
                    row,
                    expected: width,
                    found: cells.len(),
                });
            }
        }

        Ok(Self { rows, width })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.width
    }

    /// Key at `(row, col)`, or `None` for empty or out-of-range cells.
    pub fn get(&self, row: usize, col: usize) -> Option<&KeyId> {
        self.rows.get(row)?.get(col)?.as_ref()
    }

    /// Iterate over non-empty cells as `(row, col, key)`.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &KeyId)> {
        self.rows.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter_map(move |(col, cell)| cell.as_ref().map(|key| (row, col, key)))
        })
    }

    /// Position of the first cell holding `key`.
    pub fn position_of(&self, key: &KeyId) -> Option<(usize, usize)> {
        self.cells()
            .find(|(_, _, cell)| *cell == key)
            .map(|(row, col, _)| (row, col))
    }

    /// Return a copy with the cell at `(row, col)` replaced.
    pub fn with_key(&self, row: usize, col: usize, key: Option<KeyId>) -> Self {
        let mut rows = self.rows.clone();
        if let Some(cell) = rows.get_mut(row).and_then(|cells| cells.get_mut(col)) {
            *cell = key;
        }
        Self {
            rows,
            width: self.width,
        }
    }

    /// Mac-style ANSI QWERTY layout.
    pub fn qwerty() -> Self {
        let rows: Vec<Vec<Option<KeyId>>> = QWERTY
            .iter()
            .map(|row| row.iter().map(Cell::to_key).collect())
            .collect();
        let width = rows[0].len();
        Self { rows, width }
    }

    /// QWERTY with caps lock remapped to right ctrl.
    pub fn caps_as_ctrl() -> Self {
        Self::qwerty().with_key(3, 0, Some(KeyId::name("right ctrl")))
    }
}

/// Where the active layout comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutSource {
    #[default]
    Qwerty,
    CapsAsCtrl,
    Custom(Vec<Vec<Option<KeyId>>>),
}

impl LayoutSource {
    pub fn build(&self) -> Result<KeyboardLayout, LayoutError> {
        match self {
            LayoutSource::Qwerty => Ok(KeyboardLayout::qwerty()),
            LayoutSource::CapsAsCtrl => Ok(KeyboardLayout::caps_as_ctrl()),
            LayoutSource::Custom(rows) => KeyboardLayout::new(rows.clone()),
        }
    }

    /// Parse a preset name as given on the command line.
    pub fn from_preset_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace('-', "_").as_str() {
            "qwerty" => Some(LayoutSource::Qwerty),
            "caps_as_ctrl" => Some(LayoutSource::CapsAsCtrl),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LayoutSource::Qwerty => "qwerty",
            LayoutSource::CapsAsCtrl => "caps_as_ctrl",
            LayoutSource::Custom(_) => "custom",
        }
    }
}

enum Cell {
    Key(&'static str),
    Code(u32),
    Empty,
}

impl Cell {
    fn to_key(&self) -> Option<KeyId> {
        match self {
            Cell::Key(name) => Some(KeyId::name(*name)),
            Cell::Code(code) => Some(KeyId::Code(*code)),
            Cell::Empty => None,
        }
    }
}

use Cell::{Code as C, Empty as E, Key as K};

#[rustfmt::skip]
const QWERTY: [[Cell; 14]; 6] = [
    [K("esc"), E, E, E, E, E, E, E, E, E, E, E, E, E],
    [K("`"), K("1"), K("2"), K("3"), K("4"), K("5"), K("6"), K("7"), K("8"), K("9"), K("0"), K("-"), K("="), K("delete")],
    [K("tab"), K("q"), K("w"), K("e"), K("r"), K("t"), K("y"), K("u"), K("i"), K("o"), K("p"), K("["), K("]"), K("\\")],
    [K("caps lock"), K("a"), K("s"), K("d"), K("f"), K("g"), K("h"), K("j"), K("k"), K("l"), K(";"), K("'"), K("return"), K("return")],
    [K("shift"), K("shift"), K("z"), K("x"), K("c"), K("v"), K("b"), K("n"), K("m"), K(","), K("."), K("/"), K("right shift"), K("right shift")],
    [K("fn"), K("ctrl"), K("alt"), K("command"), K("space"), K("space"), K("space"), K("space"), C(54), K("right option"), K("left"), K("up"), K("down"), K("right")],
];
