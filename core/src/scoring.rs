//! Partial and absolute span scoring.

use wmc_types::{DataQuality, StorageItem, Trial};

/// Minimum processing accuracy (percent) for a session's span scores to count.
pub const DEFAULT_ACCURACY_THRESHOLD_PCT: f64 = DataQuality::DEFAULT_THRESHOLD_PCT;

/// Items recalled in their correct serial position.
///
/// Only position-wise matches earn credit; a correct item in the wrong slot
/// scores nothing.
#[must_use]
pub fn score_trial(storage: &[StorageItem], recall: &[StorageItem]) -> u32 {
    storage
        .iter()
        .zip(recall)
        .filter(|(presented, recalled)| presented == recalled)
        .count() as u32
}

/// Percentage of correct processing judgments within one trial.
#[must_use]
pub fn trial_accuracy(trial: &Trial) -> f64 {
    percent(
        trial.correct_responses(),
        trial.processing_responses().len(),
    )
}

fn percent(correct: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * correct as f64 / total as f64
    }
}

/// Session-level score totals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionScores {
    pub partial_score: u32,
    pub absolute_score: u32,
    pub total_items: u32,
    pub processing_correct: u32,
    pub processing_total: u32,
    pub processing_accuracy_pct: f64,
}

impl SessionScores {
    #[must_use]
    pub fn data_quality(&self, threshold_pct: f64) -> DataQuality {
        DataQuality::from_accuracy(self.processing_accuracy_pct, threshold_pct)
    }
}

/// Aggregate recorded trials into session totals.
///
/// Absolute credit is all-or-nothing: a trial contributes its set size only
/// when every item was recalled in place. Accuracy with no responses is 0.
#[must_use]
pub fn aggregate_session(trials: &[Trial]) -> SessionScores {
    let mut scores = SessionScores {
        partial_score: 0,
        absolute_score: 0,
        total_items: 0,
        processing_correct: 0,
        processing_total: 0,
        processing_accuracy_pct: 0.0,
    };

    for trial in trials {
        let set_size = trial.set_size() as u32;
        scores.partial_score += trial.score();
        scores.total_items += set_size;
        if trial.is_perfect() {
            scores.absolute_score += set_size;
        }
        scores.processing_correct += trial.correct_responses() as u32;
        scores.processing_total += trial.processing_responses().len() as u32;
    }

    scores.processing_accuracy_pct = percent(
        scores.processing_correct as usize,
        scores.processing_total as usize,
    );
    scores
}
