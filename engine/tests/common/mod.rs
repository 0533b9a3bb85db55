//! Shared test utilities and fixtures
//!
//! A scripted presenter that plays a participant without any UI.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::time::Duration;

use futures_util::future::AbortHandle;
use rand::SeedableRng;
use rand::rngs::StdRng;

use wmc_engine::{
    Battery, MemoryStore, PracticeFeedback, Presenter, PresenterFut, SessionReport, Settings,
    TrialFeedback,
};
use wmc_types::{ProcessingStimulus, RecallSpace, StorageItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Judging {
    AlwaysCorrect,
    AlwaysWrong,
}

/// How the scripted participant answers one recall prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecallPlan {
    /// Everything shown since the last recall, in order.
    Perfect,
    Empty,
    Items(Vec<StorageItem>),
}

#[derive(Debug)]
pub struct ScriptedPresenter {
    pub judging: Judging,
    /// Per-judgment response delays; `default_delay` once exhausted.
    pub delays: VecDeque<Duration>,
    pub default_delay: Duration,
    /// Per-prompt recall answers; `Perfect` once exhausted.
    pub recall_script: VecDeque<RecallPlan>,
    /// Answers to empty-recall confirmations; `true` once exhausted.
    pub confirm_script: VecDeque<bool>,
    /// Abort the running session after this many trial feedbacks.
    pub abort_after_trials: Option<(usize, AbortHandle)>,
    /// Abort while the session report is on screen.
    pub abort_on_report: Option<AbortHandle>,

    /// Items shown since the last answered recall.
    pub pending: Vec<StorageItem>,
    pub judgments: usize,
    pub storage_shown: Vec<StorageItem>,
    pub recall_prompts: usize,
    pub confirmations: usize,
    pub trial_feedback: Vec<TrialFeedback>,
    pub practice_feedback: Vec<PracticeFeedback>,
    pub reports: Vec<SessionReport>,
}

impl Default for ScriptedPresenter {
    fn default() -> Self {
        Self {
            judging: Judging::AlwaysCorrect,
            delays: VecDeque::new(),
            default_delay: Duration::ZERO,
            recall_script: VecDeque::new(),
            confirm_script: VecDeque::new(),
            abort_after_trials: None,
            abort_on_report: None,
            pending: Vec::new(),
            judgments: 0,
            storage_shown: Vec::new(),
            recall_prompts: 0,
            confirmations: 0,
            trial_feedback: Vec::new(),
            practice_feedback: Vec::new(),
            reports: Vec::new(),
        }
    }
}

impl ScriptedPresenter {
    pub fn saw_anything(&self) -> bool {
        self.judgments > 0 || !self.storage_shown.is_empty() || self.recall_prompts > 0
    }
}

impl Presenter for ScriptedPresenter {
    fn present_processing<'a>(
        &'a mut self,
        stimulus: &'a ProcessingStimulus,
    ) -> PresenterFut<'a, bool> {
        Box::pin(async move {
            self.judgments += 1;
            let delay = self.delays.pop_front().unwrap_or(self.default_delay);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match self.judging {
                Judging::AlwaysCorrect => stimulus.expected(),
                Judging::AlwaysWrong => !stimulus.expected(),
            }
        })
    }

    fn show_storage(&mut self, item: StorageItem) -> PresenterFut<'_, ()> {
        Box::pin(async move {
            self.storage_shown.push(item);
            self.pending.push(item);
        })
    }

    fn clear_storage(&mut self) -> PresenterFut<'_, ()> {
        Box::pin(async {})
    }

    fn collect_recall(
        &mut self,
        space: RecallSpace,
        set_size: usize,
    ) -> PresenterFut<'_, Vec<StorageItem>> {
        Box::pin(async move {
            self.recall_prompts += 1;
            assert_eq!(self.pending.len(), set_size, "recall prompt for wrong set size");
            let plan = self.recall_script.pop_front().unwrap_or(RecallPlan::Perfect);
            let recall = match plan {
                RecallPlan::Perfect => self.pending.clone(),
                RecallPlan::Empty => Vec::new(),
                RecallPlan::Items(items) => items,
            };
            assert!(recall.iter().all(|item| space.contains(item)));
            if !recall.is_empty() {
                self.pending.clear();
            }
            recall
        })
    }

    fn confirm_empty_recall(&mut self) -> PresenterFut<'_, bool> {
        Box::pin(async move {
            self.confirmations += 1;
            let confirmed = self.confirm_script.pop_front().unwrap_or(true);
            if confirmed {
                self.pending.clear();
            }
            confirmed
        })
    }

    fn show_trial_feedback<'a>(&'a mut self, feedback: &'a TrialFeedback) -> PresenterFut<'a, ()> {
        Box::pin(async move {
            self.trial_feedback.push(*feedback);
            if let Some((after, handle)) = &self.abort_after_trials
                && self.trial_feedback.len() == *after
            {
                handle.abort();
                tokio::task::yield_now().await;
            }
        })
    }

    fn show_session_result<'a>(&'a mut self, report: &'a SessionReport) -> PresenterFut<'a, ()> {
        Box::pin(async move {
            self.reports.push(report.clone());
            if let Some(handle) = &self.abort_on_report {
                handle.abort();
                tokio::task::yield_now().await;
            }
        })
    }

    fn show_practice_feedback(&mut self, feedback: PracticeFeedback) -> PresenterFut<'_, ()> {
        Box::pin(async move {
            self.practice_feedback.push(feedback);
        })
    }
}

pub type TestBattery = Battery<ScriptedPresenter, MemoryStore, StdRng>;

pub fn fast_settings() -> Settings {
    Settings {
        data_dir: None,
        ..Settings::default().without_delays()
    }
}

pub fn battery(presenter: ScriptedPresenter, seed: u64) -> TestBattery {
    Battery::new(
        presenter,
        MemoryStore::new(),
        StdRng::seed_from_u64(seed),
        fast_settings(),
    )
}
