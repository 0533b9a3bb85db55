//! Processing stimuli and their ground truth.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Operation span ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "×")]
    Multiply,
}

impl Operator {
    /// Operators allowed in the first (parenthesized) step.
    pub const FIRST_STEP: [Operator; 3] = [Operator::Add, Operator::Subtract, Operator::Multiply];
    /// Operators allowed in the second step.
    pub const SECOND_STEP: [Operator; 2] = [Operator::Add, Operator::Subtract];

    #[must_use]
    pub const fn apply(self, lhs: i32, rhs: i32) -> i32 {
        match self {
            Operator::Add => lhs + rhs,
            Operator::Subtract => lhs - rhs,
            Operator::Multiply => lhs * rhs,
        }
    }

    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '×',
        }
    }
}

/// An equation of the form `(a op1 b) op2 c = displayed_result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equation {
    pub a: i32,
    pub b: i32,
    pub c: i32,
    pub first_op: Operator,
    pub second_op: Operator,
    pub displayed_result: i32,
    pub is_displayed_correct: bool,
}

impl Equation {
    #[must_use]
    pub const fn true_result(&self) -> i32 {
        self.second_op.apply(self.first_op.apply(self.a, self.b), self.c)
    }

    /// Left-hand side as shown to the participant, e.g. `(2 × 3) + 1`.
    #[must_use]
    pub fn expression(&self) -> String {
        format!(
            "({} {} {}) {} {}",
            self.a,
            self.first_op.symbol(),
            self.b,
            self.second_op.symbol(),
            self.c
        )
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.expression(), self.displayed_result)
    }
}

// ── Symmetry span ────────────────────────────────────────────

const PATTERN_SIZE: usize = 8;

/// An 8×8 grid judged for symmetry about the vertical axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymmetryPattern {
    pub cells: [[bool; PATTERN_SIZE]; PATTERN_SIZE],
    pub is_symmetrical: bool,
}

impl SymmetryPattern {
    pub const SIZE: usize = PATTERN_SIZE;

    /// Whether the cells are actually mirror-symmetric, regardless of the
    /// label the pattern was generated with.
    #[must_use]
    pub fn is_mirror_symmetric(&self) -> bool {
        self.cells
            .iter()
            .all(|row| (0..Self::SIZE / 2).all(|col| row[col] == row[Self::SIZE - 1 - col]))
    }

    #[must_use]
    pub fn filled_count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&cell| cell).count()
    }
}

// ── Rotation span ────────────────────────────────────────────

/// Letters that look different when mirror-reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationLetter {
    F,
    G,
    J,
    L,
    P,
    R,
}

impl RotationLetter {
    pub const ALL: [RotationLetter; 6] = [
        RotationLetter::F,
        RotationLetter::G,
        RotationLetter::J,
        RotationLetter::L,
        RotationLetter::P,
        RotationLetter::R,
    ];

    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            RotationLetter::F => 'F',
            RotationLetter::G => 'G',
            RotationLetter::J => 'J',
            RotationLetter::L => 'L',
            RotationLetter::P => 'P',
            RotationLetter::R => 'R',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotatedLetter {
    pub letter: RotationLetter,
    /// Clockwise rotation, a multiple of 45 in `[0, 315]`.
    pub rotation_degrees: u16,
    pub is_mirrored: bool,
}

impl RotatedLetter {
    pub const ROTATIONS: [u16; 8] = [0, 45, 90, 135, 180, 225, 270, 315];
}

// ── ProcessingStimulus ───────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProcessingStimulus {
    Equation(Equation),
    Symmetry(SymmetryPattern),
    RotatedLetter(RotatedLetter),
}

impl ProcessingStimulus {
    /// The judgment a correct participant gives: "correct", "symmetrical"
    /// or "normal" map to `true`.
    #[must_use]
    pub const fn expected(&self) -> bool {
        match self {
            ProcessingStimulus::Equation(eq) => eq.is_displayed_correct,
            ProcessingStimulus::Symmetry(pattern) => pattern.is_symmetrical,
            ProcessingStimulus::RotatedLetter(letter) => !letter.is_mirrored,
        }
    }

    /// Whether `judgment` matches the ground truth.
    #[must_use]
    pub const fn is_correct_judgment(&self, judgment: bool) -> bool {
        judgment == self.expected()
    }
}
