//! Shared infrastructure for the complex-span battery.
//!
//! - **`atomic_write`**: crash-safe file persistence (temp + rename)

pub mod atomic_write;

pub use atomic_write::{SyncPolicy, WriteOptions, recover_backup, write_atomic, write_atomic_with};
