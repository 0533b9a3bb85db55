//! Results log persistence and JSON export.
//!
//! The log is append-only: a session result is written once, when its session
//! ends, and never edited. `JsonFileStore` keeps it as a single JSON array in
//! `wmcResults.json`, rewritten atomically on each append.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use wmc_config::Settings;
use wmc_core::{TaskHistory, summarize};
use wmc_types::SessionResult;
use wmc_utils::{recover_backup, write_atomic};

pub const RESULTS_FILE: &str = "wmcResults.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no data directory configured for the results log")]
    NoDataDir,
    #[error("failed to read results at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write results at {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("results at {} are not a valid results log: {source}", path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to serialize results: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("export is not a valid results array: {0}")]
    InvalidExport(#[source] serde_json::Error),
}

/// Append-only log of finished sessions.
pub trait ResultStore {
    fn append_result(&mut self, result: &SessionResult) -> Result<(), StoreError>;

    fn load_all_results(&self) -> Result<Vec<SessionResult>, StoreError>;

    /// Per-task history over everything stored.
    fn history(&self) -> Result<Vec<TaskHistory>, StoreError> {
        Ok(summarize(&self.load_all_results()?))
    }
}

/// In-memory log, for tests and shells that persist elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    results: Vec<SessionResult>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn results(&self) -> &[SessionResult] {
        &self.results
    }
}

impl ResultStore for MemoryStore {
    fn append_result(&mut self, result: &SessionResult) -> Result<(), StoreError> {
        self.results.push(result.clone());
        Ok(())
    }

    fn load_all_results(&self) -> Result<Vec<SessionResult>, StoreError> {
        Ok(self.results.clone())
    }
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<dir>/wmcResults.json`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(RESULTS_FILE))
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, StoreError> {
        settings
            .data_dir
            .as_deref()
            .map(Self::in_dir)
            .ok_or(StoreError::NoDataDir)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write every stored result to `<dir>/wmc-results-<timestamp>.json`.
    pub fn export_to(&self, dir: &Path, now: DateTime<Utc>) -> Result<PathBuf, StoreError> {
        let results = self.load_all_results()?;
        let json = export_json(&results)?;
        let path = dir.join(export_file_name(now));
        write_atomic(&path, json.as_bytes()).map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), results = results.len(), "Results exported");
        Ok(path)
    }
}

impl ResultStore for JsonFileStore {
    fn append_result(&mut self, result: &SessionResult) -> Result<(), StoreError> {
        let mut results = self.load_all_results()?;
        results.push(result.clone());
        let json = export_json(&results)?;
        write_atomic(&self.path, json.as_bytes()).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        tracing::info!(
            path = %self.path.display(),
            task = %result.task,
            total = results.len(),
            "Session result saved"
        );
        Ok(())
    }

    fn load_all_results(&self) -> Result<Vec<SessionResult>, StoreError> {
        recover_backup(&self.path);
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|source| {
            tracing::warn!(path = %self.path.display(), error = %source, "Malformed results log");
            StoreError::Malformed {
                path: self.path.clone(),
                source,
            }
        })
    }
}

/// Pretty-printed JSON array of results, as written to disk and exported.
pub fn export_json(results: &[SessionResult]) -> Result<String, StoreError> {
    serde_json::to_string_pretty(results).map_err(StoreError::Serialize)
}

pub fn parse_export(text: &str) -> Result<Vec<SessionResult>, StoreError> {
    serde_json::from_str(text).map_err(StoreError::InvalidExport)
}

/// `wmc-results-<RFC 3339 UTC with milliseconds>.json`.
#[must_use]
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!(
        "wmc-results-{}.json",
        now.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}
