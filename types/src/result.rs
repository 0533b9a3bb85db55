//! Session results as appended to the results log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{TaskType, Trial};

/// Participant details collected by the shell before task selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    /// Older logs hold the raw form value, so a numeric string or `""` is
    /// accepted too.
    #[serde(default, deserialize_with = "deserialize_age")]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AgeField {
    Number(u32),
    Text(String),
}

fn deserialize_age<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<AgeField>::deserialize(deserializer)? {
        None => Ok(None),
        Some(AgeField::Number(age)) => Ok(Some(age)),
        Some(AgeField::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse().map(Some).map_err(|_| {
                serde::de::Error::custom(format!("age must be a whole number, got {text:?}"))
            })
        }
    }
}

/// Data-quality annotation derived from processing accuracy.
///
/// A session below the threshold is still reported; its capacity scores just
/// should not be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    Valid,
    BelowAccuracyThreshold,
}

impl DataQuality {
    /// Processing accuracy below this percentage flags a session.
    pub const DEFAULT_THRESHOLD_PCT: f64 = 85.0;

    /// Annotate a session whose processing accuracy is `accuracy_pct`.
    #[must_use]
    pub fn from_accuracy(accuracy_pct: f64, threshold_pct: f64) -> Self {
        if accuracy_pct < threshold_pct {
            DataQuality::BelowAccuracyThreshold
        } else {
            DataQuality::Valid
        }
    }

    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, DataQuality::Valid)
    }
}

/// A finished main-task session, frozen at the end of the last trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "SessionResultRecord")]
pub struct SessionResult {
    pub task: TaskType,
    pub date: DateTime<Utc>,
    pub partial_score: u32,
    pub absolute_score: u32,
    pub total_items: u32,
    /// Percentage of processing judgments answered correctly.
    pub processing_accuracy: f64,
    pub processing_errors: u32,
    pub speed_errors: u32,
    pub data_quality: DataQuality,
    pub demographics: Demographics,
    pub trials: Vec<Trial>,
}

/// On-disk shape. Logs written before data-quality annotation carry no
/// `dataQuality`; it is derived from the stored accuracy at the default
/// threshold.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionResultRecord {
    task: TaskType,
    date: DateTime<Utc>,
    partial_score: u32,
    absolute_score: u32,
    total_items: u32,
    processing_accuracy: f64,
    processing_errors: u32,
    speed_errors: u32,
    data_quality: Option<DataQuality>,
    #[serde(default)]
    demographics: Demographics,
    trials: Vec<Trial>,
}

impl From<SessionResultRecord> for SessionResult {
    fn from(record: SessionResultRecord) -> Self {
        let data_quality = record.data_quality.unwrap_or_else(|| {
            DataQuality::from_accuracy(
                record.processing_accuracy,
                DataQuality::DEFAULT_THRESHOLD_PCT,
            )
        });
        Self {
            task: record.task,
            date: record.date,
            partial_score: record.partial_score,
            absolute_score: record.absolute_score,
            total_items: record.total_items,
            processing_accuracy: record.processing_accuracy,
            processing_errors: record.processing_errors,
            speed_errors: record.speed_errors,
            data_quality,
            demographics: record.demographics,
            trials: record.trials,
        }
    }
}

impl SessionResult {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.data_quality.is_valid()
    }
}
