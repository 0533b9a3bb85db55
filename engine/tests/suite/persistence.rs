//! Sessions written through `JsonFileStore` and read back.

use std::path::Path;

use chrono::{TimeZone, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;

use wmc_engine::{Battery, JsonFileStore, RESULTS_FILE, ResultStore, parse_export};
use wmc_types::{Demographics, TaskType};

use crate::common::{ScriptedPresenter, fast_settings};

type FileBattery = Battery<ScriptedPresenter, JsonFileStore, StdRng>;

fn file_battery(dir: &Path, seed: u64) -> FileBattery {
    Battery::new(
        ScriptedPresenter::default(),
        JsonFileStore::in_dir(dir),
        StdRng::seed_from_u64(seed),
        fast_settings(),
    )
}

#[tokio::test(start_paused = true)]
async fn finished_session_survives_a_reload() {
    let dir = tempfile::tempdir().unwrap();
    let mut battery = file_battery(dir.path(), 17);

    let report = battery
        .run_session(TaskType::Symmetry, Demographics::default())
        .await
        .unwrap();

    let reopened = JsonFileStore::new(dir.path().join(RESULTS_FILE));
    assert_eq!(reopened.load_all_results().unwrap(), vec![report.result]);
}

#[tokio::test(start_paused = true)]
async fn sessions_accumulate_into_history() {
    let dir = tempfile::tempdir().unwrap();

    for (seed, task) in [
        (1, TaskType::Rotation),
        (2, TaskType::Operation),
        (3, TaskType::Rotation),
    ] {
        let mut battery = file_battery(dir.path(), seed);
        battery
            .run_session(task, Demographics::default())
            .await
            .unwrap();
    }

    let store = JsonFileStore::in_dir(dir.path());
    let history = store.history().unwrap();
    assert_eq!(history.len(), 2);

    assert_eq!(history[0].task, TaskType::Operation);
    assert_eq!(history[0].sessions, 1);
    assert_eq!(history[0].latest_partial, 75);

    assert_eq!(history[1].task, TaskType::Rotation);
    assert_eq!(history[1].sessions, 2);
    assert_eq!(history[1].latest_partial, 42);
    assert!((history[1].average_partial - 42.0).abs() < f64::EPSILON);
}

#[tokio::test(start_paused = true)]
async fn export_contains_every_stored_session() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    let mut battery = file_battery(data.path(), 5);
    let first = battery
        .run_session(TaskType::Operation, Demographics::default())
        .await
        .unwrap();
    let second = battery
        .run_session(TaskType::Symmetry, Demographics::default())
        .await
        .unwrap();

    let now = Utc.with_ymd_and_hms(2025, 3, 9, 18, 45, 12).unwrap();
    let path = battery.store().export_to(out.path(), now).unwrap();
    assert_eq!(
        path.file_name().and_then(|name| name.to_str()),
        Some("wmc-results-2025-03-09T18:45:12.000Z.json")
    );

    let exported = parse_export(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(exported, vec![first.result, second.result]);
}
