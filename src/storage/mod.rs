//! # Storage Layer
//!
//! Persistence for the CLI host. The engine itself keeps no files; the CLI
//! saves what it needs between invocations.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Snapshot | JSON (BSP field names) | `.targetmap/snapshot.json` |
//! | Load state | JSON | `.targetmap/state.json` |
//! | Modules | JSON | `.targetmap/modules.json` |
//! | Config | TOML | `.targetmap/config.toml` |
//!
//! ## Concurrency Safety
//!
//! - Reads take a shared `fs2` lock, writes an exclusive one
//! - All writes are atomic (temp file + rename)
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point for accessing a targetmap project
//! - [`SnapshotStore`] - The imported snapshot
//! - [`StateStore`] - Loaded set between invocations
//! - [`ModuleStore`] - JSON-backed [`ProjectModelUpdater`](crate::domain::ProjectModelUpdater)
//! - [`Config`] - Project and global configuration

mod json_file;
mod config;
mod snapshot;
mod state;
mod modules;
mod project;

pub use json_file::JsonFile;
pub use config::{
    Config, ConfigError, GlobalConfig, LoggingConfig, ModelConfig, OutputFormat, ProjectConfig,
    DATA_DIR,
};
pub use snapshot::{read_snapshot_file, SnapshotStore};
pub use state::{SavedState, StateStore};
pub use modules::ModuleStore;
pub use project::{Project, ProjectError};
