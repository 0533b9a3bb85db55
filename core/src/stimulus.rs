//! Random processing stimuli and storage items.
//!
//! Every draw is independent of history. The random source is injected so a
//! seeded generator reproduces a whole session.

use rand::Rng;
use rand::seq::IndexedRandom;

use wmc_types::{
    Arrow, Equation, GridPosition, Letter, Operator, ProcessingStimulus, RotatedLetter,
    RotationLetter, StorageItem, StorageKind, SymmetryPattern, TaskType,
};

/// Probability that a symmetry-grid cell is filled.
const FILL_PROBABILITY: f64 = 0.4;

/// Largest offset applied to a wrong equation result.
const MAX_PERTURBATION: i32 = 3;

/// Draws stimuli and memoranda for a task.
#[derive(Debug, Clone)]
pub struct StimulusGenerator<R> {
    rng: R,
    strict_asymmetry: bool,
}

impl<R: Rng> StimulusGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            strict_asymmetry: false,
        }
    }

    /// Regenerate the right half of "not symmetrical" patterns until the grid
    /// really is asymmetric.
    ///
    /// Off by default: an independently filled right half can reproduce the
    /// mirror image by chance, and the published procedure accepts that.
    #[must_use]
    pub fn with_strict_asymmetry(mut self, strict: bool) -> Self {
        self.strict_asymmetry = strict;
        self
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Next processing stimulus for `task`, or `None` for tasks without a
    /// processing component.
    pub fn next_processing(&mut self, task: TaskType) -> Option<ProcessingStimulus> {
        match task {
            TaskType::Operation => Some(ProcessingStimulus::Equation(self.equation())),
            TaskType::Symmetry => Some(ProcessingStimulus::Symmetry(self.symmetry_pattern())),
            TaskType::Rotation => Some(ProcessingStimulus::RotatedLetter(self.rotated_letter())),
            TaskType::Reading => None,
        }
    }

    pub fn next_storage(&mut self, task: TaskType) -> StorageItem {
        match task.storage_kind() {
            StorageKind::Letter => StorageItem::Letter(self.pick(&Letter::ALL)),
            StorageKind::Arrow => StorageItem::Arrow(self.pick(&Arrow::ALL)),
            StorageKind::Grid => StorageItem::Grid(self.grid_position()),
        }
    }

    pub fn equation(&mut self) -> Equation {
        let a = self.rng.random_range(1..=9);
        let b = self.rng.random_range(1..=9);
        let c = self.rng.random_range(1..=9);
        let first_op = self.pick(&Operator::FIRST_STEP);
        let second_op = self.pick(&Operator::SECOND_STEP);
        let truth = second_op.apply(first_op.apply(a, b), c);

        let is_displayed_correct = self.rng.random_bool(0.5);
        let displayed_result = if is_displayed_correct {
            truth
        } else {
            let sign = if self.rng.random_bool(0.5) { -1 } else { 1 };
            truth + sign * self.rng.random_range(1..=MAX_PERTURBATION)
        };

        Equation {
            a,
            b,
            c,
            first_op,
            second_op,
            displayed_result,
            is_displayed_correct,
        }
    }

    pub fn symmetry_pattern(&mut self) -> SymmetryPattern {
        const SIZE: usize = SymmetryPattern::SIZE;
        let is_symmetrical = self.rng.random_bool(0.5);
        let mut cells = [[false; SIZE]; SIZE];

        for row in &mut cells {
            for col in 0..SIZE / 2 {
                if self.rng.random_bool(FILL_PROBABILITY) {
                    row[col] = true;
                    if is_symmetrical {
                        row[SIZE - 1 - col] = true;
                    }
                }
            }
        }

        if !is_symmetrical {
            loop {
                for row in &mut cells {
                    for cell in &mut row[SIZE / 2..] {
                        *cell = self.rng.random_bool(FILL_PROBABILITY);
                    }
                }
                let pattern = SymmetryPattern {
                    cells,
                    is_symmetrical,
                };
                if !self.strict_asymmetry || !pattern.is_mirror_symmetric() {
                    return pattern;
                }
                tracing::debug!("Regenerating accidentally symmetric pattern");
            }
        }

        SymmetryPattern {
            cells,
            is_symmetrical,
        }
    }

    pub fn rotated_letter(&mut self) -> RotatedLetter {
        RotatedLetter {
            letter: self.pick(&RotationLetter::ALL),
            rotation_degrees: self.pick(&RotatedLetter::ROTATIONS),
            is_mirrored: self.rng.random_bool(0.5),
        }
    }

    pub fn grid_position(&mut self) -> GridPosition {
        let row = self.rng.random_range(0..GridPosition::SIZE);
        let col = self.rng.random_range(0..GridPosition::SIZE);
        GridPosition::new(row, col).unwrap_or_else(|_| unreachable!("coordinates drawn in range"))
    }

    fn pick<T: Copy>(&mut self, pool: &[T]) -> T {
        *pool
            .choose(&mut self.rng)
            .unwrap_or_else(|| unreachable!("item pools are non-empty"))
    }
}
