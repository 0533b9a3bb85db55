//! Set-size schedules.
//!
//! Trial counts and set sizes follow the Redick et al. (2012) protocol that the
//! normative data was collected with.

use rand::Rng;
use rand::seq::SliceRandom;

use wmc_types::TaskType;

/// Operation and Reading span: set sizes 3-7, three trials each (75 items).
const VERBAL_SET_SIZES: [usize; 15] = [3, 3, 3, 4, 4, 4, 5, 5, 5, 6, 6, 6, 7, 7, 7];
/// Symmetry span: set sizes 2-5, two trials each (28 items).
const SYMMETRY_SET_SIZES: [usize; 8] = [2, 2, 3, 3, 4, 4, 5, 5];
/// Rotation span: set sizes 2-5, three trials each (42 items).
const ROTATION_SET_SIZES: [usize; 12] = [2, 2, 2, 3, 3, 3, 4, 4, 4, 5, 5, 5];

/// The unshuffled design table for a task.
#[must_use]
pub fn design_table(task: TaskType) -> &'static [usize] {
    match task {
        TaskType::Operation | TaskType::Reading => &VERBAL_SET_SIZES,
        TaskType::Symmetry => &SYMMETRY_SET_SIZES,
        TaskType::Rotation => &ROTATION_SET_SIZES,
    }
}

/// Shuffled schedule for one session of `task`.
pub fn build_schedule<R: Rng + ?Sized>(task: TaskType, rng: &mut R) -> SetSizeSchedule {
    SetSizeSchedule::build(task, rng)
}

/// Ordered set sizes for one session, one entry per trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetSizeSchedule {
    task: TaskType,
    set_sizes: Vec<usize>,
}

impl SetSizeSchedule {
    /// Copy the design table for `task` and permute it uniformly.
    pub fn build<R: Rng + ?Sized>(task: TaskType, rng: &mut R) -> Self {
        let mut set_sizes = design_table(task).to_vec();
        set_sizes.shuffle(rng);
        tracing::debug!(%task, ?set_sizes, "Built set-size schedule");
        Self { task, set_sizes }
    }

    /// Schedule in design-table order, without shuffling.
    #[must_use]
    pub fn unshuffled(task: TaskType) -> Self {
        Self {
            task,
            set_sizes: design_table(task).to_vec(),
        }
    }

    #[must_use]
    pub fn task(&self) -> TaskType {
        self.task
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.set_sizes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set_sizes.is_empty()
    }

    #[must_use]
    pub fn get(&self, trial_index: usize) -> Option<usize> {
        self.set_sizes.get(trial_index).copied()
    }

    #[must_use]
    pub fn total_items(&self) -> usize {
        self.set_sizes.iter().sum()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.set_sizes
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.set_sizes.iter().copied()
    }
}
