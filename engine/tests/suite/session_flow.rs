//! End-to-end sessions driven through `Battery` with a scripted participant.

use std::collections::VecDeque;
use std::time::Duration;

use futures_util::future::AbortHandle;
use rand::SeedableRng;
use rand::rngs::StdRng;

use wmc_core::PerformanceLevel;
use wmc_engine::{
    Battery, MemoryStore, PracticeFeedback, ResultStore, RunError, SessionError, SessionOutcome,
    Settings,
};
use wmc_types::{DataQuality, Demographics, Letter, StorageItem, TaskType};

use crate::common::{Judging, RecallPlan, ScriptedPresenter, battery, fast_settings};

fn participant() -> Demographics {
    Demographics {
        age: Some(29),
        gender: Some("male".to_string()),
        education: Some("master".to_string()),
        timestamp: None,
    }
}

#[tokio::test(start_paused = true)]
async fn perfect_operation_session_is_scored_and_stored() {
    let mut battery = battery(ScriptedPresenter::default(), 7);

    let report = battery
        .run_session(TaskType::Operation, participant())
        .await
        .expect("session runs");

    let result = &report.result;
    assert_eq!(result.task, TaskType::Operation);
    assert_eq!(result.trials.len(), 15);
    assert_eq!(result.total_items, 75);
    assert_eq!(result.partial_score, 75);
    assert_eq!(result.absolute_score, 75);
    assert!((result.processing_accuracy - 100.0).abs() < f64::EPSILON);
    assert_eq!(result.processing_errors, 0);
    assert_eq!(result.data_quality, DataQuality::Valid);
    assert_eq!(result.demographics, participant());
    assert_eq!(report.interpretation.level, PerformanceLevel::High);

    let stored = battery.store().load_all_results().unwrap();
    assert_eq!(stored, vec![report.result.clone()]);

    let presenter = battery.presenter();
    assert_eq!(presenter.trial_feedback.len(), 15);
    assert_eq!(presenter.reports.len(), 1);
    // 3 storage practice items, then one item per main-task step.
    assert_eq!(presenter.storage_shown.len(), 3 + 75);
    // 15 practice judgments, then one per main-task step.
    assert_eq!(presenter.judgments, 15 + 75);
    assert_eq!(
        presenter.practice_feedback[0],
        PracticeFeedback::Storage {
            score: 3,
            set_size: 3
        }
    );
}

#[tokio::test(start_paused = true)]
async fn trial_feedback_counts_up_through_the_schedule() {
    let mut battery = battery(ScriptedPresenter::default(), 11);
    battery
        .run_session(TaskType::Symmetry, Demographics::default())
        .await
        .unwrap();

    let feedback = &battery.presenter().trial_feedback;
    for (i, fb) in feedback.iter().enumerate() {
        assert_eq!(fb.trial_number, i + 1);
        assert_eq!(fb.total_trials, 8);
        assert_eq!(fb.score as usize, fb.set_size);
        assert!((fb.processing_accuracy_pct - 100.0).abs() < f64::EPSILON);
    }
    let mut sizes: Vec<usize> = feedback.iter().map(|fb| fb.set_size).collect();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![2, 2, 3, 3, 4, 4, 5, 5]);
}

#[tokio::test(start_paused = true)]
async fn declined_empty_recall_is_asked_again_without_scoring() {
    let presenter = ScriptedPresenter {
        // Storage practice, then the first main-task trial answers empty.
        recall_script: VecDeque::from([RecallPlan::Perfect, RecallPlan::Empty]),
        confirm_script: VecDeque::from([false]),
        ..ScriptedPresenter::default()
    };
    let mut battery = battery(presenter, 3);

    let report = battery
        .run_session(TaskType::Symmetry, Demographics::default())
        .await
        .unwrap();

    let presenter = battery.presenter();
    assert_eq!(presenter.confirmations, 1);
    // One storage-practice prompt, eight trials, one repeat.
    assert_eq!(presenter.recall_prompts, 1 + 8 + 1);
    assert_eq!(presenter.trial_feedback.len(), 8);
    assert_eq!(report.result.partial_score, 28);
}

#[tokio::test(start_paused = true)]
async fn confirmed_empty_recall_scores_zero() {
    let presenter = ScriptedPresenter {
        recall_script: VecDeque::from([RecallPlan::Perfect, RecallPlan::Empty]),
        confirm_script: VecDeque::from([true]),
        ..ScriptedPresenter::default()
    };
    let mut battery = battery(presenter, 3);

    let report = battery
        .run_session(TaskType::Symmetry, Demographics::default())
        .await
        .unwrap();

    let first = &report.result.trials[0];
    assert!(first.recall().is_empty());
    assert_eq!(first.score(), 0);
    assert_eq!(
        report.result.partial_score as usize,
        28 - first.set_size()
    );
    assert_eq!(
        report.result.absolute_score as usize,
        28 - first.set_size()
    );
}

#[tokio::test(start_paused = true)]
async fn slow_responses_count_as_speed_errors() {
    let presenter = ScriptedPresenter {
        // Four practice trials at 500 ms give a 500 ms deadline.
        delays: VecDeque::from(vec![Duration::from_millis(500); 4]),
        default_delay: Duration::from_millis(600),
        ..ScriptedPresenter::default()
    };
    let mut battery = Battery::new(
        presenter,
        MemoryStore::new(),
        StdRng::seed_from_u64(21),
        Settings {
            processing_practice_trials: 4,
            ..fast_settings()
        },
    );

    let limit = battery
        .run_processing_practice(TaskType::Rotation)
        .await
        .unwrap();
    assert!((limit.as_ms() - 500.0).abs() < f64::EPSILON);

    let report = battery
        .run_main_task(TaskType::Rotation, limit, Demographics::default())
        .await
        .unwrap();
    let result = &report.result;
    assert_eq!(result.total_items, 42);
    assert_eq!(result.speed_errors, 42);
    assert_eq!(result.processing_errors, 0);
    assert!(
        result
            .trials
            .iter()
            .flat_map(|t| t.processing_responses())
            .all(|r| r.rt_ms == 600)
    );
}

#[tokio::test(start_paused = true)]
async fn wrong_judgments_flag_the_session_but_still_store_it() {
    let presenter = ScriptedPresenter {
        judging: Judging::AlwaysWrong,
        ..ScriptedPresenter::default()
    };
    let mut battery = battery(presenter, 5);

    let report = battery
        .run_session(TaskType::Rotation, Demographics::default())
        .await
        .unwrap();

    assert_eq!(report.result.processing_errors, 42);
    assert_eq!(
        report.result.data_quality,
        DataQuality::BelowAccuracyThreshold
    );
    assert_eq!(report.result.partial_score, 42);
    assert_eq!(battery.store().results().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn aborted_session_persists_nothing() {
    let (handle, registration) = AbortHandle::new_pair();
    let presenter = ScriptedPresenter {
        abort_after_trials: Some((2, handle)),
        ..ScriptedPresenter::default()
    };
    let mut battery = battery(presenter, 9);

    let outcome = battery
        .run_session_abortable(TaskType::Operation, Demographics::default(), registration)
        .await
        .unwrap();

    assert_eq!(outcome, SessionOutcome::Aborted);
    assert!(battery.store().results().is_empty());
    assert_eq!(battery.presenter().trial_feedback.len(), 2);
    assert!(battery.presenter().reports.is_empty());
}

#[tokio::test(start_paused = true)]
async fn abort_after_the_result_is_stored_still_completes() {
    let (handle, registration) = AbortHandle::new_pair();
    let presenter = ScriptedPresenter {
        abort_on_report: Some(handle),
        ..ScriptedPresenter::default()
    };
    let mut battery = battery(presenter, 10);

    let outcome = battery
        .run_session_abortable(TaskType::Symmetry, Demographics::default(), registration)
        .await
        .unwrap();

    let SessionOutcome::Completed(report) = outcome else {
        panic!("a stored session must be reported as completed");
    };
    assert_eq!(battery.store().results(), &[report.result.clone()]);
    assert_eq!(battery.presenter().reports, vec![report]);
}

#[tokio::test(start_paused = true)]
async fn configured_seed_reproduces_the_session() {
    let settings = Settings {
        seed: Some(99),
        ..fast_settings()
    };
    let mut first =
        Battery::with_settings(ScriptedPresenter::default(), MemoryStore::new(), settings.clone());
    let mut second =
        Battery::with_settings(ScriptedPresenter::default(), MemoryStore::new(), settings);

    let a = first
        .run_session(TaskType::Operation, Demographics::default())
        .await
        .unwrap();
    let b = second
        .run_session(TaskType::Operation, Demographics::default())
        .await
        .unwrap();

    assert_eq!(a.result.trials, b.result.trials);
}

#[tokio::test(start_paused = true)]
async fn abortable_session_completes_when_not_aborted() {
    let (_handle, registration) = AbortHandle::new_pair();
    let mut battery = battery(ScriptedPresenter::default(), 13);

    let outcome = battery
        .run_session_abortable(TaskType::Symmetry, Demographics::default(), registration)
        .await
        .unwrap();

    let SessionOutcome::Completed(report) = outcome else {
        panic!("expected a completed session");
    };
    assert_eq!(battery.store().results(), &[report.result]);
}

#[tokio::test(start_paused = true)]
async fn reading_is_rejected_before_anything_is_shown() {
    let mut battery = battery(ScriptedPresenter::default(), 1);

    let err = battery
        .run_session(TaskType::Reading, Demographics::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RunError::Session(SessionError::UnsupportedTask {
            task: TaskType::Reading
        })
    ));
    assert!(!battery.presenter().saw_anything());
    assert!(battery.store().results().is_empty());
}

#[tokio::test(start_paused = true)]
async fn storage_practice_scores_serial_position() {
    let mut exact = battery(ScriptedPresenter::default(), 4);
    assert_eq!(
        exact
            .run_storage_practice(TaskType::Operation)
            .await
            .unwrap(),
        3
    );

    // Same seed, same items; answer them back to front.
    let shown = exact.presenter().storage_shown.clone();
    let reversed: Vec<StorageItem> = shown.iter().rev().copied().collect();
    let presenter = ScriptedPresenter {
        recall_script: VecDeque::from([RecallPlan::Items(reversed)]),
        ..ScriptedPresenter::default()
    };
    let mut backwards = battery(presenter, 4);
    let score = backwards
        .run_storage_practice(TaskType::Operation)
        .await
        .unwrap();
    let expected = shown
        .iter()
        .zip(shown.iter().rev())
        .filter(|(a, b)| a == b)
        .count() as u32;
    assert_eq!(score, expected);
    assert_eq!(backwards.presenter().storage_shown, shown);
}

#[tokio::test(start_paused = true)]
async fn overlong_practice_recall_is_rejected() {
    let presenter = ScriptedPresenter {
        recall_script: VecDeque::from([RecallPlan::Items(vec![
            StorageItem::Letter(Letter::F);
            4
        ])]),
        ..ScriptedPresenter::default()
    };
    let mut battery = battery(presenter, 2);
    let err = battery
        .run_storage_practice(TaskType::Operation)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RunError::Session(SessionError::RecallTooLong {
            set_size: 3,
            recalled: 4
        })
    ));
}

#[tokio::test(start_paused = true)]
async fn same_seed_reproduces_the_session() {
    let mut first = battery(ScriptedPresenter::default(), 2012);
    let mut second = battery(ScriptedPresenter::default(), 2012);

    let a = first
        .run_session(TaskType::Rotation, Demographics::default())
        .await
        .unwrap();
    let b = second
        .run_session(TaskType::Rotation, Demographics::default())
        .await
        .unwrap();

    assert_eq!(a.result.trials, b.result.trials);
    assert_eq!(
        first.presenter().storage_shown,
        second.presenter().storage_shown
    );
}

#[tokio::test(start_paused = true)]
async fn default_presentation_delays_run_on_the_paused_clock() {
    let mut battery = Battery::new(
        ScriptedPresenter::default(),
        MemoryStore::new(),
        StdRng::seed_from_u64(8),
        Settings {
            data_dir: None,
            ..Settings::default()
        },
    );

    let started = tokio::time::Instant::now();
    battery
        .run_session(TaskType::Symmetry, Demographics::default())
        .await
        .unwrap();

    // 3 practice items and 28 main items at 1000 ms + 250 ms, plus 14 practice gaps.
    let expected = Duration::from_millis((3 + 28) * 1250 + 14 * 250);
    assert_eq!(started.elapsed(), expected);
}
