//! Session engine for the complex-span battery.
//!
//! [`SessionMachine`] is the synchronous main-task state machine. [`Battery`]
//! drives it, and the practice blocks, against a [`Presenter`] and a
//! [`ResultStore`], sleeping through presentation delays on the tokio timer.

mod persistence;
mod presenter;
mod runner;
mod session;

pub use persistence::{
    JsonFileStore, MemoryStore, RESULTS_FILE, ResultStore, StoreError, export_file_name,
    export_json, parse_export,
};
pub use presenter::{PracticeFeedback, Presenter, PresenterFut};
pub use runner::{Battery, RunError, SessionOutcome};
pub use session::{
    AbortedSession, Advance, SessionError, SessionMachine, StepAdvance, StepOutcome,
    TrialFeedback, validate_recall,
};

pub use wmc_config::Settings;
pub use wmc_core::{SessionReport, TimeLimit};
