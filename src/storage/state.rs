//! Load state storage
//!
//! `.targetmap/state.json` keeps the loaded set between invocations, tagged
//! with the fingerprint of the snapshot it was computed for.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::DATA_DIR;
use super::json_file::JsonFile;
use crate::domain::ModelState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedState {
    #[serde(flatten)]
    pub state: ModelState,
    pub updated_at: DateTime<Utc>,
}

impl SavedState {
    pub fn now(state: ModelState) -> Self {
        Self {
            state,
            updated_at: Utc::now(),
        }
    }
}

pub struct StateStore {
    file: JsonFile<SavedState>,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }

    /// Creates the default store for a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(DATA_DIR).join("state.json"))
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn read(&self) -> Result<Option<SavedState>> {
        self.file.read()
    }

    /// Saves the state stamped with the current time
    pub fn write(&self, state: ModelState) -> Result<SavedState> {
        let saved = SavedState::now(state);
        self.file.write(&saved)?;
        Ok(saved)
    }

    /// Forgets the saved state
    pub fn reset(&self) -> Result<bool> {
        self.file.remove()
    }
}
