//! Core domain types for the complex-span battery.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod items;
mod result;
mod stimulus;
mod trial;

pub use items::{Arrow, GridPosition, GridPositionError, Letter, RecallSpace, StorageItem};
pub use result::{DataQuality, Demographics, SessionResult};
pub use stimulus::{
    Equation, Operator, ProcessingStimulus, RotatedLetter, RotationLetter, SymmetryPattern,
};
pub use trial::{ProcessingResponse, Trial, TrialError};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Task Types
// ============================================================================

/// The complex-span task variants.
///
/// `Reading` is a legacy variant: it shares the Operation schedule and letter
/// storage items but has no processing stimulus and no published norms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Operation,
    Symmetry,
    Rotation,
    Reading,
}

/// Kind of item a task asks the participant to remember.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    Letter,
    Grid,
    Arrow,
}

impl TaskType {
    /// Tasks with a processing stimulus and normative data.
    pub const ALL_SCORED: [TaskType; 3] =
        [TaskType::Operation, TaskType::Symmetry, TaskType::Rotation];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TaskType::Operation => "operation",
            TaskType::Symmetry => "symmetry",
            TaskType::Rotation => "rotation",
            TaskType::Reading => "reading",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            TaskType::Operation => "Operation Span",
            TaskType::Symmetry => "Symmetry Span",
            TaskType::Rotation => "Rotation Span",
            TaskType::Reading => "Reading Span",
        }
    }

    #[must_use]
    pub const fn storage_kind(self) -> StorageKind {
        match self {
            TaskType::Operation | TaskType::Reading => StorageKind::Letter,
            TaskType::Symmetry => StorageKind::Grid,
            TaskType::Rotation => StorageKind::Arrow,
        }
    }

    /// Whether the task has a processing stimulus the engine can generate.
    #[must_use]
    pub const fn has_processing_task(self) -> bool {
        !matches!(self, TaskType::Reading)
    }

    #[must_use]
    pub const fn recall_space(self) -> RecallSpace {
        match self.storage_kind() {
            StorageKind::Letter => RecallSpace::Letters,
            StorageKind::Grid => RecallSpace::Grid,
            StorageKind::Arrow => RecallSpace::Arrows,
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown task type: {0}")]
pub struct UnknownTaskType(pub String);

impl FromStr for TaskType {
    type Err = UnknownTaskType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "operation" => Ok(TaskType::Operation),
            "symmetry" => Ok(TaskType::Symmetry),
            "rotation" => Ok(TaskType::Rotation),
            "reading" => Ok(TaskType::Reading),
            other => Err(UnknownTaskType(other.to_string())),
        }
    }
}
