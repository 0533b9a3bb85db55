//! Normative percentiles and qualitative interpretation.
//!
//! Norms are the published means and SDs from Redick et al. (2012), Table 3
//! (N = 6,274). Scores are converted to z-scores and then to percentiles
//! through the Abramowitz-Stegun approximation of the standard normal CDF.

use serde::Serialize;

use wmc_types::{SessionResult, TaskType};

/// Percentile reported when a task has no norms.
pub const NEUTRAL_PERCENTILE: u8 = 50;

/// Published reference distribution for one task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Norms {
    pub partial_mean: f64,
    pub partial_sd: f64,
    pub absolute_mean: f64,
    pub absolute_sd: f64,
}

const OPERATION_NORMS: Norms = Norms {
    partial_mean: 57.36,
    partial_sd: 13.65,
    absolute_mean: 42.04,
    absolute_sd: 17.67,
};

const SYMMETRY_NORMS: Norms = Norms {
    partial_mean: 27.87,
    partial_sd: 8.26,
    absolute_mean: 18.76,
    absolute_sd: 9.62,
};

const ROTATION_NORMS: Norms = Norms {
    partial_mean: 53.81,
    partial_sd: 15.09,
    absolute_mean: 36.51,
    absolute_sd: 18.83,
};

impl Norms {
    /// `None` for tasks without published norms (Reading).
    #[must_use]
    pub const fn for_task(task: TaskType) -> Option<Norms> {
        match task {
            TaskType::Operation => Some(OPERATION_NORMS),
            TaskType::Symmetry => Some(SYMMETRY_NORMS),
            TaskType::Rotation => Some(ROTATION_NORMS),
            TaskType::Reading => None,
        }
    }
}

/// Standard normal CDF, Abramowitz & Stegun 26.2.17.
#[must_use]
pub fn normal_cdf(z: f64) -> f64 {
    let t = 1.0 / (1.0 + 0.231_641_9 * z.abs());
    let density = 0.398_942_3 * (-z * z / 2.0).exp();
    let tail = density
        * t
        * (0.319_381_5
            + t * (-0.356_563_8 + t * (1.781_478 + t * (-1.821_256 + t * 1.330_274))));
    if z > 0.0 { 1.0 - tail } else { tail }
}

/// Percentile rank of `score` in a normal distribution with `mean` and `sd`.
///
/// A degenerate `sd` yields the neutral 50th percentile.
#[must_use]
pub fn percentile(score: f64, mean: f64, sd: f64) -> u8 {
    if sd.is_nan() || sd <= 0.0 {
        return NEUTRAL_PERCENTILE;
    }
    let z = (score - mean) / sd;
    (100.0 * normal_cdf(z)).round().clamp(0.0, 100.0) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Percentiles {
    pub partial: u8,
    pub absolute: u8,
}

/// Percentiles of a partial/absolute score pair; unknown tasks fail soft to 50.
#[must_use]
pub fn percentiles_for(task: TaskType, partial_score: u32, absolute_score: u32) -> Percentiles {
    let Some(norms) = Norms::for_task(task) else {
        tracing::debug!(%task, "No norms for task; reporting neutral percentiles");
        return Percentiles {
            partial: NEUTRAL_PERCENTILE,
            absolute: NEUTRAL_PERCENTILE,
        };
    };
    Percentiles {
        partial: percentile(
            f64::from(partial_score),
            norms.partial_mean,
            norms.partial_sd,
        ),
        absolute: percentile(
            f64::from(absolute_score),
            norms.absolute_mean,
            norms.absolute_sd,
        ),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PerformanceLevel {
    High,
    AboveAverage,
    Average,
    BelowAverage,
}

impl PerformanceLevel {
    #[must_use]
    pub const fn from_percentile(percentile: u8) -> Self {
        match percentile {
            75.. => PerformanceLevel::High,
            50..75 => PerformanceLevel::AboveAverage,
            25..50 => PerformanceLevel::Average,
            _ => PerformanceLevel::BelowAverage,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            PerformanceLevel::High => "High",
            PerformanceLevel::AboveAverage => "Above Average",
            PerformanceLevel::Average => "Average",
            PerformanceLevel::BelowAverage => "Below Average",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            PerformanceLevel::High => {
                "Your working memory capacity is in the high range. This suggests strong abilities in maintaining information while processing distractions, which is associated with better performance in complex cognitive tasks, reading comprehension, and problem-solving."
            }
            PerformanceLevel::AboveAverage => {
                "Your working memory capacity is above average. You demonstrate good ability to maintain and manipulate information in the face of interference, which supports effective performance in most cognitive tasks."
            }
            PerformanceLevel::Average => {
                "Your working memory capacity is in the average range. This is typical performance for healthy young adults and supports adequate cognitive functioning in daily tasks."
            }
            PerformanceLevel::BelowAverage => {
                "Your working memory capacity is below average. This may reflect difficulty maintaining information while processing distractions. However, working memory can be improved through practice and targeted training."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interpretation {
    pub level: PerformanceLevel,
    pub description: &'static str,
}

/// Band a percentile into a qualitative level with its fixed description.
#[must_use]
pub const fn interpret(percentile: u8) -> Interpretation {
    let level = PerformanceLevel::from_percentile(percentile);
    Interpretation {
        level,
        description: level.description(),
    }
}

/// Everything the presenter needs to show at the end of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub result: SessionResult,
    pub percentiles: Percentiles,
    /// Banded on the partial-score percentile.
    pub interpretation: Interpretation,
}

impl SessionReport {
    #[must_use]
    pub fn build(result: SessionResult) -> Self {
        let percentiles =
            percentiles_for(result.task, result.partial_score, result.absolute_score);
        let interpretation = interpret(percentiles.partial);
        Self {
            result,
            percentiles,
            interpretation,
        }
    }
}
