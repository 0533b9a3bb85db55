//! Per-task summaries over stored session results.

use chrono::{DateTime, Utc};
use serde::Serialize;

use wmc_types::{SessionResult, TaskType};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskHistory {
    pub task: TaskType,
    pub sessions: usize,
    pub latest_partial: u32,
    pub latest_date: DateTime<Utc>,
    pub average_partial: f64,
}

/// One summary per scored task that has at least one session, in battery order.
///
/// "Latest" is the session stored last, since the log is append-only.
#[must_use]
pub fn summarize(results: &[SessionResult]) -> Vec<TaskHistory> {
    TaskType::ALL_SCORED
        .iter()
        .filter_map(|&task| summarize_task(task, results))
        .collect()
}

fn summarize_task(task: TaskType, results: &[SessionResult]) -> Option<TaskHistory> {
    let sessions: Vec<&SessionResult> = results.iter().filter(|r| r.task == task).collect();
    let latest = *sessions.last()?;

    let total: u64 = sessions.iter().map(|r| u64::from(r.partial_score)).sum();
    Some(TaskHistory {
        task,
        sessions: sessions.len(),
        latest_partial: latest.partial_score,
        latest_date: latest.date,
        average_partial: total as f64 / sessions.len() as f64,
    })
}
