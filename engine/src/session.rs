//! Main-task session state machine.
//!
//! One `SessionMachine` owns everything a session accumulates: the schedule,
//! the calibrated deadline, per-trial buffers, error counters and finished
//! trials. The driver feeds it timestamps and participant input; the machine
//! never sleeps or reads a clock itself.
//!
//! ```text
//! AwaitingTrial ─advance_trial─▶ RunningTrial(step, Ready)
//!   Ready ─next_processing─▶ Judging ─record_processing_response─▶ Storing
//!   Storing ─storage_presented─▶ Ready (next step) | AwaitingRecall
//! AwaitingRecall ─push_recall/clear_recall─▶ RecallInProgress
//! AwaitingRecall | RecallInProgress ─submit_recall─▶ Scored
//! Scored ─advance_trial─▶ RunningTrial(0, Ready) | Ended
//! ```

use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::Rng;
use thiserror::Error;

use wmc_core::{
    DEFAULT_ACCURACY_THRESHOLD_PCT, SetSizeSchedule, StimulusGenerator, TimeLimit,
    aggregate_session, score_trial, trial_accuracy,
};
use wmc_types::{
    DataQuality, Demographics, ProcessingResponse, ProcessingStimulus, SessionResult,
    StorageItem, TaskType, Trial, TrialError,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("{task} has no processing task and cannot be run")]
    UnsupportedTask { task: TaskType },
    #[error("schedule is for {schedule} but the session is {task}")]
    ScheduleMismatch { task: TaskType, schedule: TaskType },
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },
    #[error("recalled {recalled} items but only {set_size} were presented")]
    RecallTooLong { set_size: usize, recalled: usize },
    #[error("{item} is not a {task} recall item")]
    WrongItemKind { task: TaskType, item: StorageItem },
    #[error(transparent)]
    Trial(#[from] TrialError),
}

/// Reject recall lists the task could not have produced.
pub fn validate_recall(
    task: TaskType,
    set_size: usize,
    recall: &[StorageItem],
) -> Result<(), SessionError> {
    if recall.len() > set_size {
        return Err(SessionError::RecallTooLong {
            set_size,
            recalled: recall.len(),
        });
    }
    let space = task.recall_space();
    if let Some(item) = recall.iter().find(|item| !space.contains(item)) {
        return Err(SessionError::WrongItemKind { task, item: *item });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
enum StepState {
    Ready,
    Judging {
        stimulus: ProcessingStimulus,
        shown_at: Instant,
    },
    Storing {
        item: StorageItem,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    AwaitingTrial,
    RunningTrial { step: usize, state: StepState },
    AwaitingRecall,
    RecallInProgress { recall: Vec<StorageItem> },
    Scored,
    Ended,
}

impl Phase {
    const fn name(&self) -> &'static str {
        match self {
            Phase::AwaitingTrial => "awaiting trial",
            Phase::RunningTrial {
                state: StepState::Ready,
                ..
            } => "ready for a processing step",
            Phase::RunningTrial {
                state: StepState::Judging { .. },
                ..
            } => "awaiting a processing judgment",
            Phase::RunningTrial {
                state: StepState::Storing { .. },
                ..
            } => "presenting a storage item",
            Phase::AwaitingRecall => "awaiting recall",
            Phase::RecallInProgress { .. } => "collecting recall",
            Phase::Scored => "showing trial feedback",
            Phase::Ended => "ended",
        }
    }
}

/// Buffers for the trial in progress.
#[derive(Debug, Clone, Default)]
struct TrialBuffer {
    index: usize,
    set_size: usize,
    items: Vec<StorageItem>,
    responses: Vec<ProcessingResponse>,
}

/// Result of [`SessionMachine::advance_trial`].
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Trial {
        index: usize,
        set_size: usize,
        total: usize,
    },
    Ended(SessionResult),
}

/// What happened on one processing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: usize,
    pub correct: bool,
    pub rt_ms: u64,
    pub too_slow: bool,
    /// Storage item to show next.
    pub item: StorageItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAdvance {
    NextStep { step: usize },
    RecallDue { set_size: usize },
}

/// Per-trial summary shown between trials.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialFeedback {
    /// 1-based.
    pub trial_number: usize,
    pub total_trials: usize,
    pub score: u32,
    pub set_size: usize,
    pub processing_accuracy_pct: f64,
}

/// A session abandoned before its result was frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbortedSession {
    pub task: TaskType,
    pub completed_trials: usize,
}

#[derive(Debug)]
pub struct SessionMachine<R> {
    task: TaskType,
    schedule: SetSizeSchedule,
    time_limit: TimeLimit,
    demographics: Demographics,
    started_at: DateTime<Utc>,
    generator: StimulusGenerator<R>,
    accuracy_threshold_pct: f64,
    phase: Phase,
    current: TrialBuffer,
    trials: Vec<Trial>,
    processing_errors: u32,
    speed_errors: u32,
}

impl<R: Rng> SessionMachine<R> {
    /// Start a main-task session. The `TimeLimit` can only come from a
    /// finished practice calibration.
    pub fn start(
        task: TaskType,
        schedule: SetSizeSchedule,
        time_limit: TimeLimit,
        demographics: Demographics,
        started_at: DateTime<Utc>,
        generator: StimulusGenerator<R>,
    ) -> Result<Self, SessionError> {
        if !task.has_processing_task() {
            return Err(SessionError::UnsupportedTask { task });
        }
        if schedule.task() != task {
            return Err(SessionError::ScheduleMismatch {
                task,
                schedule: schedule.task(),
            });
        }
        tracing::info!(
            %task,
            trials = schedule.len(),
            time_limit_ms = time_limit.as_ms().round(),
            "Session started"
        );
        Ok(Self {
            task,
            trials: Vec::with_capacity(schedule.len()),
            schedule,
            time_limit,
            demographics,
            started_at,
            generator,
            accuracy_threshold_pct: DEFAULT_ACCURACY_THRESHOLD_PCT,
            phase: Phase::AwaitingTrial,
            current: TrialBuffer::default(),
            processing_errors: 0,
            speed_errors: 0,
        })
    }

    #[must_use]
    pub fn with_accuracy_threshold(mut self, threshold_pct: f64) -> Self {
        self.accuracy_threshold_pct = threshold_pct;
        self
    }

    #[must_use]
    pub fn task(&self) -> TaskType {
        self.task
    }

    #[must_use]
    pub fn time_limit(&self) -> TimeLimit {
        self.time_limit
    }

    #[must_use]
    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    #[must_use]
    pub fn processing_errors(&self) -> u32 {
        self.processing_errors
    }

    #[must_use]
    pub fn speed_errors(&self) -> u32 {
        self.speed_errors
    }

    #[must_use]
    pub fn state_name(&self) -> &'static str {
        self.phase.name()
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        matches!(self.phase, Phase::Ended)
    }

    /// Items selected so far in incremental recall.
    #[must_use]
    pub fn recall_buffer(&self) -> &[StorageItem] {
        match &self.phase {
            Phase::RecallInProgress { recall } => recall,
            _ => &[],
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            state: self.phase.name(),
            action,
        }
    }

    /// Begin the next trial, or end the session when the schedule is spent.
    /// `now` stamps the result when the session ends.
    pub fn advance_trial(&mut self, now: DateTime<Utc>) -> Result<Advance, SessionError> {
        if !matches!(self.phase, Phase::AwaitingTrial | Phase::Scored) {
            return Err(self.invalid("advance to the next trial"));
        }

        let index = self.trials.len();
        let Some(set_size) = self.schedule.get(index) else {
            self.phase = Phase::Ended;
            return Ok(Advance::Ended(self.freeze(now)));
        };

        self.current = TrialBuffer {
            index,
            set_size,
            items: Vec::with_capacity(set_size),
            responses: Vec::with_capacity(set_size),
        };
        self.phase = Phase::RunningTrial {
            step: 0,
            state: StepState::Ready,
        };
        tracing::debug!(trial = index + 1, set_size, "Trial started");
        Ok(Advance::Trial {
            index,
            set_size,
            total: self.schedule.len(),
        })
    }

    /// Draw the stimulus for the current step; `now` starts its RT timer.
    pub fn next_processing(&mut self, now: Instant) -> Result<ProcessingStimulus, SessionError> {
        let step = match self.phase {
            Phase::RunningTrial {
                step,
                state: StepState::Ready,
            } => step,
            _ => return Err(self.invalid("present a processing stimulus")),
        };
        let stimulus = self
            .generator
            .next_processing(self.task)
            .ok_or(SessionError::UnsupportedTask { task: self.task })?;
        self.phase = Phase::RunningTrial {
            step,
            state: StepState::Judging {
                stimulus: stimulus.clone(),
                shown_at: now,
            },
        };
        Ok(stimulus)
    }

    /// Record the participant's judgment and draw the storage item that follows.
    pub fn record_processing_response(
        &mut self,
        judgment: bool,
        now: Instant,
    ) -> Result<StepOutcome, SessionError> {
        let Phase::RunningTrial {
            step,
            state: StepState::Judging { stimulus, shown_at },
        } = &self.phase
        else {
            return Err(self.invalid("record a processing response"));
        };
        let step = *step;
        let correct = stimulus.is_correct_judgment(judgment);
        let rt_ms = now.saturating_duration_since(*shown_at).as_millis() as u64;
        let too_slow = self.time_limit.is_exceeded_by(rt_ms);

        if !correct {
            self.processing_errors += 1;
        }
        if too_slow {
            self.speed_errors += 1;
        }
        self.current
            .responses
            .push(ProcessingResponse { correct, rt_ms });

        let item = self.generator.next_storage(self.task);
        self.current.items.push(item);
        self.phase = Phase::RunningTrial {
            step,
            state: StepState::Storing { item },
        };
        tracing::debug!(step, correct, rt_ms, too_slow, "Processing response recorded");

        Ok(StepOutcome {
            step,
            correct,
            rt_ms,
            too_slow,
            item,
        })
    }

    /// The storage item has been shown and cleared.
    pub fn storage_presented(&mut self) -> Result<StepAdvance, SessionError> {
        let Phase::RunningTrial {
            step,
            state: StepState::Storing { .. },
        } = self.phase
        else {
            return Err(self.invalid("finish presenting a storage item"));
        };

        let next = step + 1;
        if next < self.current.set_size {
            self.phase = Phase::RunningTrial {
                step: next,
                state: StepState::Ready,
            };
            Ok(StepAdvance::NextStep { step: next })
        } else {
            self.phase = Phase::AwaitingRecall;
            Ok(StepAdvance::RecallDue {
                set_size: self.current.set_size,
            })
        }
    }

    /// Append one selection to the incremental recall buffer.
    pub fn push_recall(&mut self, item: StorageItem) -> Result<(), SessionError> {
        let mut recall = match &self.phase {
            Phase::AwaitingRecall => Vec::with_capacity(self.current.set_size),
            Phase::RecallInProgress { recall } => recall.clone(),
            _ => return Err(self.invalid("select a recall item")),
        };
        recall.push(item);
        validate_recall(self.task, self.current.set_size, &recall)?;
        self.phase = Phase::RecallInProgress { recall };
        Ok(())
    }

    pub fn clear_recall(&mut self) -> Result<(), SessionError> {
        if !matches!(
            self.phase,
            Phase::AwaitingRecall | Phase::RecallInProgress { .. }
        ) {
            return Err(self.invalid("clear recall"));
        }
        self.phase = Phase::RecallInProgress { recall: Vec::new() };
        Ok(())
    }

    /// Score the buffered selections from [`push_recall`](Self::push_recall).
    pub fn submit_buffered_recall(&mut self) -> Result<TrialFeedback, SessionError> {
        let recall = self.recall_buffer().to_vec();
        self.submit_recall(recall)
    }

    /// Score the ordered recall and close the trial. An empty list is a valid
    /// answer; confirming it is the presenter's job.
    pub fn submit_recall(&mut self, recall: Vec<StorageItem>) -> Result<TrialFeedback, SessionError> {
        if !matches!(
            self.phase,
            Phase::AwaitingRecall | Phase::RecallInProgress { .. }
        ) {
            return Err(self.invalid("submit recall"));
        }
        validate_recall(self.task, self.current.set_size, &recall)?;

        let score = score_trial(&self.current.items, &recall);
        let trial = Trial::new(
            self.current.items.clone(),
            recall,
            self.current.responses.clone(),
            score,
        )?;
        let feedback = TrialFeedback {
            trial_number: self.current.index + 1,
            total_trials: self.schedule.len(),
            score,
            set_size: trial.set_size(),
            processing_accuracy_pct: trial_accuracy(&trial),
        };
        self.trials.push(trial);
        self.phase = Phase::Scored;

        tracing::debug!(
            trial = feedback.trial_number,
            score,
            set_size = feedback.set_size,
            "Trial scored"
        );
        Ok(feedback)
    }

    /// Abandon the session. Nothing recorded so far survives.
    pub fn abort(self) -> AbortedSession {
        tracing::info!(
            task = %self.task,
            completed_trials = self.trials.len(),
            state = self.phase.name(),
            "Session aborted"
        );
        AbortedSession {
            task: self.task,
            completed_trials: self.trials.len(),
        }
    }

    fn freeze(&self, finished_at: DateTime<Utc>) -> SessionResult {
        let scores = aggregate_session(&self.trials);
        let processing_accuracy = (scores.processing_accuracy_pct * 10.0).round() / 10.0;
        let data_quality =
            DataQuality::from_accuracy(processing_accuracy, self.accuracy_threshold_pct);

        tracing::info!(
            task = %self.task,
            partial_score = scores.partial_score,
            absolute_score = scores.absolute_score,
            total_items = scores.total_items,
            processing_accuracy,
            speed_errors = self.speed_errors,
            duration_secs = (finished_at - self.started_at).num_seconds(),
            valid = data_quality.is_valid(),
            "Session ended"
        );
        if !data_quality.is_valid() {
            tracing::warn!(
                processing_accuracy,
                threshold = self.accuracy_threshold_pct,
                "Processing accuracy below threshold; span scores may be unreliable"
            );
        }

        SessionResult {
            task: self.task,
            date: finished_at,
            partial_score: scores.partial_score,
            absolute_score: scores.absolute_score,
            total_items: scores.total_items,
            processing_accuracy,
            processing_errors: self.processing_errors,
            speed_errors: self.speed_errors,
            data_quality,
            demographics: self.demographics.clone(),
            trials: self.trials.clone(),
        }
    }
}
