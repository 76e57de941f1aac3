//! Snapshot storage
//!
//! The imported snapshot lives in `.targetmap/snapshot.json`, in the same
//! camelCase JSON shape it is imported from.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::config::DATA_DIR;
use super::json_file::JsonFile;
use crate::domain::ProjectSnapshot;

pub struct SnapshotStore {
    file: JsonFile<ProjectSnapshot>,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }

    /// Creates the default store for a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(DATA_DIR).join("snapshot.json"))
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Reads the stored snapshot, or None if nothing was imported yet
    pub fn read(&self) -> Result<Option<ProjectSnapshot>> {
        self.file.read()
    }

    pub fn write(&self, snapshot: &ProjectSnapshot) -> Result<()> {
        self.file.write(snapshot)
    }
}

/// Reads and validates a snapshot file produced by a build tool
pub fn read_snapshot_file(path: &Path) -> Result<ProjectSnapshot> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;

    let snapshot: ProjectSnapshot = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse snapshot: {}", path.display()))?;

    snapshot
        .validate()
        .with_context(|| format!("Invalid snapshot: {}", path.display()))?;

    Ok(snapshot)
}
