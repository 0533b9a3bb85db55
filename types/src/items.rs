//! Storage items: the things a participant has to remember.
//!
//! JSON forms follow the results export format: letters and arrows are
//! one-character strings, grid positions are `{"row": r, "col": c}`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::StorageKind;

// ── Letters ──────────────────────────────────────────────────

/// Consonants used as Operation/Reading span memoranda.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Letter {
    F,
    H,
    J,
    K,
    L,
    N,
    P,
    Q,
    R,
    S,
    T,
    Y,
}

impl Letter {
    pub const ALL: [Letter; 12] = [
        Letter::F,
        Letter::H,
        Letter::J,
        Letter::K,
        Letter::L,
        Letter::N,
        Letter::P,
        Letter::Q,
        Letter::R,
        Letter::S,
        Letter::T,
        Letter::Y,
    ];

    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Letter::F => 'F',
            Letter::H => 'H',
            Letter::J => 'J',
            Letter::K => 'K',
            Letter::L => 'L',
            Letter::N => 'N',
            Letter::P => 'P',
            Letter::Q => 'Q',
            Letter::R => 'R',
            Letter::S => 'S',
            Letter::T => 'T',
            Letter::Y => 'Y',
        }
    }

    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_char() == c)
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

// ── Arrows ───────────────────────────────────────────────────

/// Compass arrows used as Rotation span memoranda.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arrow {
    #[serde(rename = "↑")]
    Up,
    #[serde(rename = "↗")]
    UpRight,
    #[serde(rename = "→")]
    Right,
    #[serde(rename = "↘")]
    DownRight,
    #[serde(rename = "↓")]
    Down,
    #[serde(rename = "↙")]
    DownLeft,
    #[serde(rename = "←")]
    Left,
    #[serde(rename = "↖")]
    UpLeft,
}

impl Arrow {
    /// Clockwise from north.
    pub const ALL: [Arrow; 8] = [
        Arrow::Up,
        Arrow::UpRight,
        Arrow::Right,
        Arrow::DownRight,
        Arrow::Down,
        Arrow::DownLeft,
        Arrow::Left,
        Arrow::UpLeft,
    ];

    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Arrow::Up => '↑',
            Arrow::UpRight => '↗',
            Arrow::Right => '→',
            Arrow::DownRight => '↘',
            Arrow::Down => '↓',
            Arrow::DownLeft => '↙',
            Arrow::Left => '←',
            Arrow::UpLeft => '↖',
        }
    }
}

impl fmt::Display for Arrow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

// ── Grid positions ───────────────────────────────────────────

/// A cell of the 4×4 Symmetry span memory grid.
///
/// Out-of-range coordinates are unrepresentable: construction and
/// deserialization both go through [`GridPosition::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawGridPosition")]
pub struct GridPosition {
    row: u8,
    col: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("grid position ({row}, {col}) is outside the {size}x{size} memory grid", size = GridPosition::SIZE)]
pub struct GridPositionError {
    pub row: u8,
    pub col: u8,
}

#[derive(Deserialize)]
struct RawGridPosition {
    row: u8,
    col: u8,
}

impl TryFrom<RawGridPosition> for GridPosition {
    type Error = GridPositionError;

    fn try_from(raw: RawGridPosition) -> Result<Self, Self::Error> {
        Self::new(raw.row, raw.col)
    }
}

impl GridPosition {
    pub const SIZE: u8 = 4;

    pub fn new(row: u8, col: u8) -> Result<Self, GridPositionError> {
        if row < Self::SIZE && col < Self::SIZE {
            Ok(Self { row, col })
        } else {
            Err(GridPositionError { row, col })
        }
    }

    #[must_use]
    pub const fn row(self) -> u8 {
        self.row
    }

    #[must_use]
    pub const fn col(self) -> u8 {
        self.col
    }

    /// All 16 cells in row-major order.
    pub fn all() -> impl Iterator<Item = GridPosition> {
        (0..Self::SIZE).flat_map(|row| (0..Self::SIZE).map(move |col| GridPosition { row, col }))
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

// ── StorageItem ──────────────────────────────────────────────

/// One memorandum presented after a processing judgment.
///
/// Equality is value equality; for grid positions that is (row, col).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StorageItem {
    Letter(Letter),
    Arrow(Arrow),
    Grid(GridPosition),
}

impl StorageItem {
    #[must_use]
    pub const fn kind(&self) -> StorageKind {
        match self {
            StorageItem::Letter(_) => StorageKind::Letter,
            StorageItem::Arrow(_) => StorageKind::Arrow,
            StorageItem::Grid(_) => StorageKind::Grid,
        }
    }
}

impl From<Letter> for StorageItem {
    fn from(value: Letter) -> Self {
        StorageItem::Letter(value)
    }
}

impl From<Arrow> for StorageItem {
    fn from(value: Arrow) -> Self {
        StorageItem::Arrow(value)
    }
}

impl From<GridPosition> for StorageItem {
    fn from(value: GridPosition) -> Self {
        StorageItem::Grid(value)
    }
}

impl fmt::Display for StorageItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageItem::Letter(letter) => letter.fmt(f),
            StorageItem::Arrow(arrow) => arrow.fmt(f),
            StorageItem::Grid(pos) => pos.fmt(f),
        }
    }
}

// ── RecallSpace ──────────────────────────────────────────────

/// The selection space offered to the participant at recall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecallSpace {
    Letters,
    Grid,
    Arrows,
}

impl RecallSpace {
    /// Every selectable item, in presentation order.
    #[must_use]
    pub fn items(self) -> Vec<StorageItem> {
        match self {
            RecallSpace::Letters => Letter::ALL.into_iter().map(StorageItem::from).collect(),
            RecallSpace::Grid => GridPosition::all().map(StorageItem::from).collect(),
            RecallSpace::Arrows => Arrow::ALL.into_iter().map(StorageItem::from).collect(),
        }
    }

    #[must_use]
    pub fn contains(self, item: &StorageItem) -> bool {
        matches!(
            (self, item.kind()),
            (RecallSpace::Letters, StorageKind::Letter)
                | (RecallSpace::Grid, StorageKind::Grid)
                | (RecallSpace::Arrows, StorageKind::Arrow)
        )
    }
}
