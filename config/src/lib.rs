//! Configuration for the complex-span battery.
//!
//! Reads `~/.wmc/config.toml`. Every key is optional; [`Settings::resolve`]
//! fills defaults from the published protocol and validates the result.
//!
//! ```toml
//! [practice]
//! processing_trials = 15
//! storage_items = 3
//! gap_ms = 250
//!
//! [timing]
//! storage_display_ms = 1000
//! inter_stimulus_ms = 250
//!
//! [scoring]
//! accuracy_threshold_pct = 85.0
//! time_limit_sd = 2.5
//!
//! [stimulus]
//! strict_asymmetry = false
//! seed = 42
//!
//! [storage]
//! data_dir = "/var/lib/wmc"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use thiserror::Error;

use wmc_core::{DEFAULT_ACCURACY_THRESHOLD_PCT, DEFAULT_PRACTICE_TRIALS, DEFAULT_SD_MULTIPLIER};

const DEFAULT_STORAGE_PRACTICE_ITEMS: usize = 3;
const DEFAULT_PRACTICE_GAP_MS: u64 = 250;
const DEFAULT_STORAGE_DISPLAY_MS: u64 = 1000;
const DEFAULT_INTER_STIMULUS_MS: u64 = 250;

/// Fewest practice trials that still give a spread estimate.
const MIN_PRACTICE_TRIALS: usize = 2;

const CONFIG_DIR: &str = ".wmc";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WmcConfig {
    pub practice: Option<PracticeConfig>,
    pub timing: Option<TimingConfig>,
    pub scoring: Option<ScoringConfig>,
    pub stimulus: Option<StimulusConfig>,
    pub storage: Option<StorageConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PracticeConfig {
    /// Processing-only practice trials used for speed calibration.
    pub processing_trials: Option<usize>,
    /// Items in the storage-only practice trial.
    pub storage_items: Option<usize>,
    /// Pause between processing practice trials.
    pub gap_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TimingConfig {
    pub storage_display_ms: Option<u64>,
    pub inter_stimulus_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScoringConfig {
    pub accuracy_threshold_pct: Option<f64>,
    /// Response deadline width in practice-RT standard deviations.
    pub time_limit_sd: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StimulusConfig {
    #[serde(default)]
    pub strict_asymmetry: bool,
    /// Fixed RNG seed for reproducible sessions.
    pub seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StorageConfig {
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

impl WmcConfig {
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        Self::load_from(&path)
    }

    /// Load from an explicit path; a missing file is `Ok(None)`.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Failed to read config");
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Failed to parse config");
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Default directory for the results log.
#[must_use]
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR))
}

/// Validated runtime settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub processing_practice_trials: usize,
    pub storage_practice_items: usize,
    pub practice_gap: Duration,
    pub storage_display: Duration,
    pub inter_stimulus: Duration,
    pub accuracy_threshold_pct: f64,
    pub time_limit_sd: f64,
    pub strict_asymmetry: bool,
    pub seed: Option<u64>,
    pub data_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            processing_practice_trials: DEFAULT_PRACTICE_TRIALS,
            storage_practice_items: DEFAULT_STORAGE_PRACTICE_ITEMS,
            practice_gap: Duration::from_millis(DEFAULT_PRACTICE_GAP_MS),
            storage_display: Duration::from_millis(DEFAULT_STORAGE_DISPLAY_MS),
            inter_stimulus: Duration::from_millis(DEFAULT_INTER_STIMULUS_MS),
            accuracy_threshold_pct: DEFAULT_ACCURACY_THRESHOLD_PCT,
            time_limit_sd: DEFAULT_SD_MULTIPLIER,
            strict_asymmetry: false,
            seed: None,
            data_dir: default_data_dir(),
        }
    }
}

impl Settings {
    /// Merge a loaded config over the defaults and validate.
    pub fn resolve(config: Option<&WmcConfig>) -> Result<Self, ConfigError> {
        let mut settings = Self::default();
        let Some(config) = config else {
            return Ok(settings);
        };

        if let Some(practice) = &config.practice {
            if let Some(trials) = practice.processing_trials {
                settings.processing_practice_trials = trials;
            }
            if let Some(items) = practice.storage_items {
                settings.storage_practice_items = items;
            }
            if let Some(ms) = practice.gap_ms {
                settings.practice_gap = Duration::from_millis(ms);
            }
        }
        if let Some(timing) = &config.timing {
            if let Some(ms) = timing.storage_display_ms {
                settings.storage_display = Duration::from_millis(ms);
            }
            if let Some(ms) = timing.inter_stimulus_ms {
                settings.inter_stimulus = Duration::from_millis(ms);
            }
        }
        if let Some(scoring) = &config.scoring {
            if let Some(pct) = scoring.accuracy_threshold_pct {
                settings.accuracy_threshold_pct = pct;
            }
            if let Some(sd) = scoring.time_limit_sd {
                settings.time_limit_sd = sd;
            }
        }
        if let Some(stimulus) = &config.stimulus {
            settings.strict_asymmetry = stimulus.strict_asymmetry;
            settings.seed = stimulus.seed;
        }
        if let Some(dir) = config.storage.as_ref().and_then(|s| s.data_dir.clone()) {
            settings.data_dir = Some(dir);
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Load `~/.wmc/config.toml` and resolve it.
    pub fn load() -> Result<Self, ConfigError> {
        let config = WmcConfig::load()?;
        Self::resolve(config.as_ref())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing_practice_trials < MIN_PRACTICE_TRIALS {
            return Err(ConfigError::Invalid {
                field: "practice.processing_trials",
                reason: format!(
                    "must be at least {MIN_PRACTICE_TRIALS}, got {}",
                    self.processing_practice_trials
                ),
            });
        }
        if self.storage_practice_items == 0 {
            return Err(ConfigError::Invalid {
                field: "practice.storage_items",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.time_limit_sd.is_finite() && self.time_limit_sd > 0.0) {
            return Err(ConfigError::Invalid {
                field: "scoring.time_limit_sd",
                reason: format!("must be positive, got {}", self.time_limit_sd),
            });
        }
        if !(0.0..=100.0).contains(&self.accuracy_threshold_pct) {
            return Err(ConfigError::Invalid {
                field: "scoring.accuracy_threshold_pct",
                reason: format!(
                    "must be within 0-100, got {}",
                    self.accuracy_threshold_pct
                ),
            });
        }
        Ok(())
    }

    /// Session random source: seeded from `[stimulus] seed` when set, from the
    /// OS otherwise.
    #[must_use]
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => {
                tracing::debug!(seed, "Using fixed stimulus seed");
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_os_rng(),
        }
    }

    /// Zero every presentation delay. For scripted runs.
    #[must_use]
    pub fn without_delays(mut self) -> Self {
        self.practice_gap = Duration::ZERO;
        self.storage_display = Duration::ZERO;
        self.inter_stimulus = Duration::ZERO;
        self
    }
}
