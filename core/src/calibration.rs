//! Processing-speed calibration from the processing-only practice block.
//!
//! The practice reaction times set a per-participant response deadline for the
//! main task: `mean + k * sd` with the population standard deviation and
//! `k = 2.5` by default. Responses slower than the deadline count as speed
//! errors.

use thiserror::Error;

/// Default number of processing-only practice trials.
pub const DEFAULT_PRACTICE_TRIALS: usize = 15;

/// Default deadline width in standard deviations.
pub const DEFAULT_SD_MULTIPLIER: f64 = 2.5;

/// Calibrated response deadline for main-task processing judgments.
///
/// Only [`PracticeCalibrator`] and [`compute_time_limit`] produce one, so
/// holding a `TimeLimit` proves calibration ran.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeLimit {
    limit_ms: f64,
    mean_ms: f64,
    sd_ms: f64,
}

impl TimeLimit {
    #[must_use]
    pub fn as_ms(self) -> f64 {
        self.limit_ms
    }

    #[must_use]
    pub fn mean_ms(self) -> f64 {
        self.mean_ms
    }

    #[must_use]
    pub fn sd_ms(self) -> f64 {
        self.sd_ms
    }

    /// A response strictly slower than the deadline is a speed error.
    #[must_use]
    pub fn is_exceeded_by(self, rt_ms: u64) -> bool {
        rt_ms as f64 > self.limit_ms
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalibrationError {
    #[error("cannot calibrate without practice reaction times")]
    NoSamples,
    #[error("calibration has not been started")]
    NotStarted,
    #[error("calibration already finished")]
    AlreadyDone,
}

/// `mean + sd_multiplier * population_sd` over `rts`.
///
/// A single sample has zero spread, so its deadline is the sample itself.
pub fn compute_time_limit(rts: &[u64], sd_multiplier: f64) -> Result<TimeLimit, CalibrationError> {
    if rts.is_empty() {
        return Err(CalibrationError::NoSamples);
    }
    let n = rts.len() as f64;
    let mean = rts.iter().map(|&rt| rt as f64).sum::<f64>() / n;
    let sd = if rts.len() < 2 {
        tracing::warn!(
            samples = rts.len(),
            "Too few practice trials for a spread estimate; using the mean as the deadline"
        );
        0.0
    } else {
        let variance = rts
            .iter()
            .map(|&rt| (rt as f64 - mean).powi(2))
            .sum::<f64>()
            / n;
        variance.sqrt()
    };

    let limit_ms = mean + sd_multiplier * sd;
    tracing::info!(
        limit_ms = limit_ms.round(),
        mean_ms = mean.round(),
        sd_ms = sd.round(),
        "Processing time limit calibrated"
    );
    Ok(TimeLimit {
        limit_ms,
        mean_ms: mean,
        sd_ms: sd,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationProgress {
    Continue { remaining: usize },
    Done(TimeLimit),
}

#[derive(Debug, Clone, PartialEq)]
enum CalibrationState {
    NotStarted,
    Running { rts: Vec<u64> },
    Done(TimeLimit),
}

/// Collects practice reaction times until the configured count is reached.
#[derive(Debug, Clone)]
pub struct PracticeCalibrator {
    trials: usize,
    sd_multiplier: f64,
    state: CalibrationState,
}

impl Default for PracticeCalibrator {
    fn default() -> Self {
        Self::new(DEFAULT_PRACTICE_TRIALS, DEFAULT_SD_MULTIPLIER)
    }
}

impl PracticeCalibrator {
    #[must_use]
    pub fn new(trials: usize, sd_multiplier: f64) -> Self {
        Self {
            trials: trials.max(1),
            sd_multiplier,
            state: CalibrationState::NotStarted,
        }
    }

    #[must_use]
    pub fn trials(&self) -> usize {
        self.trials
    }

    /// Start (or restart) the practice block, discarding earlier samples.
    pub fn begin(&mut self) -> Result<(), CalibrationError> {
        if let CalibrationState::Done(_) = self.state {
            return Err(CalibrationError::AlreadyDone);
        }
        self.state = CalibrationState::Running {
            rts: Vec::with_capacity(self.trials),
        };
        Ok(())
    }

    /// Index of the next practice trial, if running.
    #[must_use]
    pub fn trial_index(&self) -> Option<usize> {
        match &self.state {
            CalibrationState::Running { rts } => Some(rts.len()),
            _ => None,
        }
    }

    pub fn record(&mut self, rt_ms: u64) -> Result<CalibrationProgress, CalibrationError> {
        let rts = match &mut self.state {
            CalibrationState::NotStarted => return Err(CalibrationError::NotStarted),
            CalibrationState::Done(_) => return Err(CalibrationError::AlreadyDone),
            CalibrationState::Running { rts } => rts,
        };
        rts.push(rt_ms);
        tracing::debug!(trial = rts.len(), rt_ms, "Practice response recorded");

        if rts.len() < self.trials {
            return Ok(CalibrationProgress::Continue {
                remaining: self.trials - rts.len(),
            });
        }

        let limit = compute_time_limit(rts, self.sd_multiplier)?;
        self.state = CalibrationState::Done(limit);
        Ok(CalibrationProgress::Done(limit))
    }

    #[must_use]
    pub fn time_limit(&self) -> Option<TimeLimit> {
        match self.state {
            CalibrationState::Done(limit) => Some(limit),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self.state, CalibrationState::Done(_))
    }
}
