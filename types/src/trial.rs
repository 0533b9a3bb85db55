//! Recorded trials.
//!
//! A [`Trial`] is built once, at recall submission, and never mutated after.
//! Its invariants are checked at construction so history consumers can rely on
//! them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::StorageItem;

/// The participant's judgment of one processing stimulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingResponse {
    pub correct: bool,
    /// Reaction time from stimulus onset to judgment.
    #[serde(rename = "rt")]
    pub rt_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrialError {
    #[error("trial must present at least one storage item")]
    Empty,
    #[error("recall has {recalled} items but only {set_size} were presented")]
    RecallTooLong { set_size: usize, recalled: usize },
    #[error("expected {set_size} processing responses, got {responses}")]
    ResponseCountMismatch { set_size: usize, responses: usize },
    #[error("score {score} exceeds set size {set_size}")]
    ScoreTooHigh { set_size: usize, score: u32 },
    #[error("recorded set size {recorded} does not match {presented} presented items")]
    SetSizeMismatch { recorded: usize, presented: usize },
}

/// One completed processing/storage trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TrialRecord")]
pub struct Trial {
    set_size: usize,
    items: Vec<StorageItem>,
    recall: Vec<StorageItem>,
    processing_responses: Vec<ProcessingResponse>,
    score: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrialRecord {
    set_size: usize,
    items: Vec<StorageItem>,
    recall: Vec<StorageItem>,
    processing_responses: Vec<ProcessingResponse>,
    score: u32,
}

impl TryFrom<TrialRecord> for Trial {
    type Error = TrialError;

    fn try_from(record: TrialRecord) -> Result<Self, Self::Error> {
        if record.set_size != record.items.len() {
            return Err(TrialError::SetSizeMismatch {
                recorded: record.set_size,
                presented: record.items.len(),
            });
        }
        Self::new(
            record.items,
            record.recall,
            record.processing_responses,
            record.score,
        )
    }
}

impl Trial {
    pub fn new(
        items: Vec<StorageItem>,
        recall: Vec<StorageItem>,
        processing_responses: Vec<ProcessingResponse>,
        score: u32,
    ) -> Result<Self, TrialError> {
        let set_size = items.len();
        if set_size == 0 {
            return Err(TrialError::Empty);
        }
        if recall.len() > set_size {
            return Err(TrialError::RecallTooLong {
                set_size,
                recalled: recall.len(),
            });
        }
        if processing_responses.len() != set_size {
            return Err(TrialError::ResponseCountMismatch {
                set_size,
                responses: processing_responses.len(),
            });
        }
        if score as usize > set_size {
            return Err(TrialError::ScoreTooHigh { set_size, score });
        }
        Ok(Self {
            set_size,
            items,
            recall,
            processing_responses,
            score,
        })
    }

    #[must_use]
    pub fn set_size(&self) -> usize {
        self.set_size
    }

    #[must_use]
    pub fn items(&self) -> &[StorageItem] {
        &self.items
    }

    #[must_use]
    pub fn recall(&self) -> &[StorageItem] {
        &self.recall
    }

    #[must_use]
    pub fn processing_responses(&self) -> &[ProcessingResponse] {
        &self.processing_responses
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// All items recalled in their serial position.
    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.score as usize == self.set_size
    }

    #[must_use]
    pub fn correct_responses(&self) -> usize {
        self.processing_responses
            .iter()
            .filter(|r| r.correct)
            .count()
    }
}
