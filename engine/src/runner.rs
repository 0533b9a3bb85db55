//! Async session driver.
//!
//! `Battery` sequences one task end to end: storage-only practice,
//! processing-only practice (which calibrates the response deadline), then
//! the scored main task. Presentation delays are `tokio::time::sleep`s, so
//! dropping or aborting the driver future cancels them.

use std::time::Duration;

use chrono::Utc;
use futures_util::future::{AbortRegistration, Abortable};
use rand::Rng;
use rand::rngs::StdRng;
use thiserror::Error;
use tokio::time::Instant;

use wmc_config::Settings;
use wmc_core::{
    CalibrationError, CalibrationProgress, PracticeCalibrator, SessionReport, SetSizeSchedule,
    StimulusGenerator, TimeLimit, score_trial,
};
use wmc_types::{Demographics, SessionResult, TaskType};

use crate::persistence::{ResultStore, StoreError};
use crate::presenter::{PracticeFeedback, Presenter, collect_confirmed_recall};
use crate::session::{Advance, SessionError, SessionMachine, validate_recall};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// The result was stored and the report shown.
    Completed(SessionReport),
    /// Cancelled before the result was stored; nothing was persisted.
    Aborted,
}

/// Drives sessions against a presenter and a results store.
#[derive(Debug)]
pub struct Battery<P, S, R> {
    presenter: P,
    store: S,
    rng: R,
    settings: Settings,
}

impl<P, S> Battery<P, S, StdRng>
where
    P: Presenter,
    S: ResultStore,
{
    /// Battery whose random source comes from [`Settings::rng`].
    pub fn with_settings(presenter: P, store: S, settings: Settings) -> Self {
        let rng = settings.rng();
        Self::new(presenter, store, rng, settings)
    }
}

impl<P, S, R> Battery<P, S, R>
where
    P: Presenter,
    S: ResultStore,
    R: Rng,
{
    pub fn new(presenter: P, store: S, rng: R, settings: Settings) -> Self {
        Self {
            presenter,
            store,
            rng,
            settings,
        }
    }

    #[must_use]
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn into_parts(self) -> (P, S) {
        (self.presenter, self.store)
    }

    /// Storage-only practice. Returns the number of items recalled in place.
    pub async fn run_storage_practice(&mut self, task: TaskType) -> Result<u32, RunError> {
        let Self {
            presenter,
            rng,
            settings,
            ..
        } = self;
        let set_size = settings.storage_practice_items;
        let mut generator = StimulusGenerator::new(rng);

        let mut items = Vec::with_capacity(set_size);
        for _ in 0..set_size {
            let item = generator.next_storage(task);
            items.push(item);
            presenter.show_storage(item).await;
            pause(settings.storage_display).await;
            presenter.clear_storage().await;
            pause(settings.inter_stimulus).await;
        }

        let recall = collect_confirmed_recall(presenter, task.recall_space(), set_size).await;
        validate_recall(task, set_size, &recall)?;
        let score = score_trial(&items, &recall);
        presenter
            .show_practice_feedback(PracticeFeedback::Storage { score, set_size })
            .await;

        tracing::info!(%task, score, set_size, "Storage practice finished");
        Ok(score)
    }

    /// Processing-only practice; calibrates the main-task response deadline.
    pub async fn run_processing_practice(&mut self, task: TaskType) -> Result<TimeLimit, RunError> {
        let Self {
            presenter,
            rng,
            settings,
            ..
        } = self;
        let mut generator =
            StimulusGenerator::new(rng).with_strict_asymmetry(settings.strict_asymmetry);
        let mut calibrator =
            PracticeCalibrator::new(settings.processing_practice_trials, settings.time_limit_sd);
        calibrator.begin()?;

        loop {
            let stimulus = generator
                .next_processing(task)
                .ok_or(SessionError::UnsupportedTask { task })?;
            let shown_at = Instant::now();
            let judgment = presenter.present_processing(&stimulus).await;
            let rt_ms = shown_at.elapsed().as_millis() as u64;
            let correct = stimulus.is_correct_judgment(judgment);
            presenter
                .show_practice_feedback(PracticeFeedback::Processing { correct, rt_ms })
                .await;

            match calibrator.record(rt_ms)? {
                CalibrationProgress::Continue { .. } => pause(settings.practice_gap).await,
                CalibrationProgress::Done(limit) => return Ok(limit),
            }
        }
    }

    /// Scored main task. The result is appended to the store before the
    /// report is shown.
    pub async fn run_main_task(
        &mut self,
        task: TaskType,
        time_limit: TimeLimit,
        demographics: Demographics,
    ) -> Result<SessionReport, RunError> {
        let result = self.run_trials(task, time_limit, demographics).await?;
        self.finish(result).await
    }

    /// Storage practice, processing practice, then the main task.
    pub async fn run_session(
        &mut self,
        task: TaskType,
        demographics: Demographics,
    ) -> Result<SessionReport, RunError> {
        let result = self.collect_session(task, demographics).await?;
        self.finish(result).await
    }

    /// [`run_session`](Self::run_session) that stops at the next suspension
    /// point once its `AbortHandle` fires.
    ///
    /// Only the work before the result is stored can be aborted. Once the
    /// result is in the store the session completes and its report is
    /// returned, whatever happens to the handle.
    pub async fn run_session_abortable(
        &mut self,
        task: TaskType,
        demographics: Demographics,
        registration: AbortRegistration,
    ) -> Result<SessionOutcome, RunError> {
        let result =
            match Abortable::new(self.collect_session(task, demographics), registration).await {
                Ok(result) => result?,
                Err(_aborted) => {
                    tracing::info!(%task, "Session aborted; partial data discarded");
                    return Ok(SessionOutcome::Aborted);
                }
            };
        Ok(SessionOutcome::Completed(self.finish(result).await?))
    }

    async fn collect_session(
        &mut self,
        task: TaskType,
        demographics: Demographics,
    ) -> Result<SessionResult, RunError> {
        if !task.has_processing_task() {
            return Err(SessionError::UnsupportedTask { task }.into());
        }
        tracing::info!(%task, "Starting session");
        self.run_storage_practice(task).await?;
        let time_limit = self.run_processing_practice(task).await?;
        self.run_trials(task, time_limit, demographics).await
    }

    /// Drive every scheduled trial and return the frozen result, unsaved.
    async fn run_trials(
        &mut self,
        task: TaskType,
        time_limit: TimeLimit,
        demographics: Demographics,
    ) -> Result<SessionResult, RunError> {
        let Self {
            presenter,
            rng,
            settings,
            ..
        } = self;
        let schedule = SetSizeSchedule::build(task, rng);
        let generator =
            StimulusGenerator::new(&mut *rng).with_strict_asymmetry(settings.strict_asymmetry);
        let mut machine =
            SessionMachine::start(task, schedule, time_limit, demographics, Utc::now(), generator)?
                .with_accuracy_threshold(settings.accuracy_threshold_pct);

        loop {
            let set_size = match machine.advance_trial(Utc::now())? {
                Advance::Trial { set_size, .. } => set_size,
                Advance::Ended(result) => return Ok(result),
            };

            for _ in 0..set_size {
                let stimulus = machine.next_processing(Instant::now().into_std())?;
                let judgment = presenter.present_processing(&stimulus).await;
                let outcome =
                    machine.record_processing_response(judgment, Instant::now().into_std())?;

                presenter.show_storage(outcome.item).await;
                pause(settings.storage_display).await;
                presenter.clear_storage().await;
                pause(settings.inter_stimulus).await;
                machine.storage_presented()?;
            }

            let recall = collect_confirmed_recall(presenter, task.recall_space(), set_size).await;
            let feedback = machine.submit_recall(recall)?;
            presenter.show_trial_feedback(&feedback).await;
        }
    }

    async fn finish(&mut self, result: SessionResult) -> Result<SessionReport, RunError> {
        self.store.append_result(&result)?;
        let report = SessionReport::build(result);
        self.presenter.show_session_result(&report).await;
        Ok(report)
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
