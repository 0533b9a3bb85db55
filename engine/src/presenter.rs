//! The rendering collaborator.
//!
//! The engine decides what to show and when; a `Presenter` shows it and
//! reports what the participant did. Each method returns a boxed future so the
//! trait stays object-safe and implementors can await their own UI events.

use std::future::Future;
use std::pin::Pin;

use wmc_core::SessionReport;
use wmc_types::{ProcessingStimulus, RecallSpace, StorageItem};

use crate::session::TrialFeedback;

/// Presenter future type alias.
pub type PresenterFut<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Feedback for practice blocks, which never reach the results log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PracticeFeedback {
    Processing { correct: bool, rt_ms: u64 },
    Storage { score: u32, set_size: usize },
}

pub trait Presenter {
    /// Show a processing stimulus and resolve with the participant's
    /// judgment (`true` = "correct" / "symmetrical" / "normal").
    fn present_processing<'a>(&'a mut self, stimulus: &'a ProcessingStimulus)
    -> PresenterFut<'a, bool>;

    fn show_storage(&mut self, item: StorageItem) -> PresenterFut<'_, ()>;

    fn clear_storage(&mut self) -> PresenterFut<'_, ()>;

    /// Collect an ordered recall from `space`. May resolve empty.
    fn collect_recall(&mut self, space: RecallSpace, set_size: usize)
    -> PresenterFut<'_, Vec<StorageItem>>;

    /// Ask whether an empty recall should be submitted as is.
    fn confirm_empty_recall(&mut self) -> PresenterFut<'_, bool>;

    /// Show per-trial feedback; resolves when the participant continues.
    fn show_trial_feedback<'a>(&'a mut self, feedback: &'a TrialFeedback) -> PresenterFut<'a, ()>;

    fn show_session_result<'a>(&'a mut self, report: &'a SessionReport) -> PresenterFut<'a, ()>;

    fn show_practice_feedback(&mut self, _feedback: PracticeFeedback) -> PresenterFut<'_, ()> {
        Box::pin(async {})
    }
}

/// Collect a recall, re-asking while the participant declines to submit an
/// empty one.
pub(crate) async fn collect_confirmed_recall<P: Presenter + ?Sized>(
    presenter: &mut P,
    space: RecallSpace,
    set_size: usize,
) -> Vec<StorageItem> {
    loop {
        let recall = presenter.collect_recall(space, set_size).await;
        if !recall.is_empty() || presenter.confirm_empty_recall().await {
            return recall;
        }
        tracing::debug!("Empty recall declined; asking again");
    }
}
