//! Pure algorithms for the complex-span battery.
//!
//! Nothing here does IO or awaits: stimulus generation, set-size planning,
//! processing-speed calibration, scoring, normative interpretation and history
//! summaries. The engine crate drives these from its session state machine.

pub mod calibration;
pub mod history;
pub mod norms;
pub mod plan;
pub mod scoring;
pub mod stimulus;

pub use calibration::{
    CalibrationError, CalibrationProgress, DEFAULT_PRACTICE_TRIALS, DEFAULT_SD_MULTIPLIER,
    PracticeCalibrator, TimeLimit, compute_time_limit,
};
pub use history::{TaskHistory, summarize};
pub use norms::{
    Interpretation, Norms, PerformanceLevel, Percentiles, SessionReport, interpret, percentile,
    percentiles_for,
};
pub use plan::{SetSizeSchedule, build_schedule, design_table};
pub use scoring::{
    DEFAULT_ACCURACY_THRESHOLD_PCT, SessionScores, aggregate_session, score_trial, trial_accuracy,
};
pub use stimulus::StimulusGenerator;
