//! Project management
//!
//! Handles project initialization and ties the stores to a [`TargetModel`].

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::config::DATA_DIR;
use super::snapshot::read_snapshot_file;
use super::{Config, ModuleStore, SnapshotStore, StateStore};
use crate::domain::{ChangeDiff, ProjectSnapshot, TargetModel};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a targetmap project. Run 'targetmap init' first.")]
    NotInProject,

    #[error("No snapshot imported. Run 'targetmap import <file>' first.")]
    NoSnapshot,
}

/// A targetmap project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.join(DATA_DIR).is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let data_dir = root.join(DATA_DIR);

        fs::create_dir_all(&data_dir).with_context(|| {
            format!("Failed to create {} directory: {}", DATA_DIR, data_dir.display())
        })?;

        let config_path = data_dir.join("config.toml");
        if !config_path.exists() {
            let default_config = r#"# targetmap configuration

[model]
# Default selection policy: input_order, by_id or dependency_aware
selection = "input_order"

# Treat files of different targets in the same directory as overlapping
directory_grouping = true

# Module names: target_id or sanitized
module_naming = "target_id"

[logging]
# Level or filter directives (RUST_LOG is appended)
level = "warn"
"#;
            fs::write(&config_path, default_config)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let gitignore_path = data_dir.join(".gitignore");
        if !gitignore_path.exists() {
            let gitignore = r#"# Local load state
state.json
modules.json
*.tmp
"#;
            fs::write(&gitignore_path, gitignore).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .targetmap directory path
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn snapshot_store(&self) -> SnapshotStore {
        SnapshotStore::for_project(&self.root)
    }

    pub fn state_store(&self) -> StateStore {
        StateStore::for_project(&self.root)
    }

    pub fn module_store(&self) -> Result<ModuleStore> {
        ModuleStore::for_project(&self.root)
    }

    /// Imports a snapshot file, discarding state derived from the previous one
    pub fn import_snapshot(&self, path: &Path) -> Result<ProjectSnapshot> {
        let snapshot = read_snapshot_file(path)?;
        self.snapshot_store().write(&snapshot)?;
        self.state_store().reset()?;
        self.module_store()?.reset()?;

        tracing::debug!(
            path = %path.display(),
            targets = snapshot.targets.len(),
            "imported snapshot"
        );
        Ok(snapshot)
    }

    /// Builds the model for the imported snapshot and restores saved state
    ///
    /// Saved state that no longer matches the snapshot or the configured
    /// policies is discarded with a warning, together with the modules
    /// materialized from it.
    pub fn open_model(&self) -> Result<TargetModel> {
        let snapshot = self.snapshot_store().read()?.ok_or(ProjectError::NoSnapshot)?;
        let settings = self.config.project.model.settings();
        let mut model = TargetModel::new(snapshot, settings).context("Failed to build model")?;

        if let Some(saved) = self.state_store().read()? {
            if let Err(e) = model.restore(saved.state) {
                tracing::warn!(error = %e, "discarding saved load state");
                self.state_store().reset()?;
                self.module_store()?
                    .reset()
                    .context("Failed to reset materialized modules")?;
            }
        }

        Ok(model)
    }

    /// Persists the model state and applies the diff to the module store
    pub fn commit(&self, model: &TargetModel, diff: Option<ChangeDiff>) -> Result<()> {
        self.state_store().write(model.to_state())?;

        if let Some(diff) = diff {
            let mut modules = self.module_store()?;
            diff.apply_on(&mut modules)
                .context("Failed to update materialized modules")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TargetId;
    use tempfile::TempDir;

    const SNAPSHOT: &str = r#"{
        "targets": [{"id": "//a"}, {"id": "//b"}, {"id": "//c"}],
        "sources": [
            {"target": "//a", "sources": [{"uri": "file:///src/A.java", "kind": "FILE"}]},
            {"target": "//b", "sources": [{"uri": "file:///src/A.java", "kind": "FILE"}]},
            {"target": "//c", "sources": [{"uri": "file:///other/C.java", "kind": "FILE"}]}
        ]
    }"#;

    fn project_with_snapshot() -> (TempDir, Project) {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();
        let path = dir.path().join("targets.json");
        fs::write(&path, SNAPSHOT).unwrap();
        project.import_snapshot(&path).unwrap();
        (dir, project)
    }

    #[test]
    fn init_creates_structure() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        assert!(project.data_dir().is_dir());
        assert!(project.data_dir().join("config.toml").is_file());
        assert!(project.data_dir().join(".gitignore").is_file());
        assert_eq!(project.config().project, Default::default());
    }

    #[test]
    fn init_is_idempotent() {
        let dir = TempDir::new().unwrap();

        Project::init(dir.path()).unwrap();
        Project::init(dir.path()).unwrap(); // Should not fail

        assert!(dir.path().join(DATA_DIR).is_dir());
    }

    #[test]
    fn open_non_project_fails() {
        let dir = TempDir::new().unwrap();
        assert!(Project::open(dir.path()).is_err());
    }

    #[test]
    fn open_model_requires_snapshot() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        let err = project.open_model().unwrap_err();
        assert!(err.to_string().contains("No snapshot imported"));
    }

    #[test]
    fn state_survives_reopen() {
        let (dir, project) = project_with_snapshot();

        let mut model = project.open_model().unwrap();
        let diff = model.load_target(&TargetId::new("//b")).unwrap();
        project.commit(&model, diff).unwrap();

        let reopened = Project::open(dir.path()).unwrap().open_model().unwrap();
        let loaded: Vec<_> = reopened
            .all_loaded_targets()
            .into_iter()
            .map(|t| t.id.to_string())
            .collect();
        assert_eq!(loaded, vec!["//b"]);
        assert_eq!(project.module_store().unwrap().len(), 1);
    }

    #[test]
    fn reimport_discards_state() {
        let (dir, project) = project_with_snapshot();

        let mut model = project.open_model().unwrap();
        let diff = model.load_default_targets();
        project.commit(&model, Some(diff)).unwrap();
        assert!(project.state_store().read().unwrap().is_some());

        project.import_snapshot(&dir.path().join("targets.json")).unwrap();
        assert!(project.state_store().read().unwrap().is_none());
        assert!(project.module_store().unwrap().is_empty());
        assert!(!project.open_model().unwrap().is_initialized());
    }

    #[test]
    fn stale_state_is_discarded() {
        let (_dir, project) = project_with_snapshot();

        let mut model = project.open_model().unwrap();
        let diff = model.load_default_targets();
        project.commit(&model, Some(diff)).unwrap();
        assert!(!project.module_store().unwrap().is_empty());

        project
            .state_store()
            .write(crate::domain::ModelState {
                snapshot: "outdated".to_string(),
                loaded: Some(vec![TargetId::new("//a")]),
            })
            .unwrap();

        let model = project.open_model().unwrap();
        assert!(!model.is_initialized());
        assert!(project.state_store().read().unwrap().is_none());
        assert!(project.module_store().unwrap().is_empty());
    }

    fn write_model_config(dir: &Path, body: &str) {
        fs::write(dir.join(DATA_DIR).join("config.toml"), format!("[model]\n{}\n", body)).unwrap();
    }

    fn module_targets(project: &Project) -> Vec<String> {
        project
            .module_store()
            .unwrap()
            .modules()
            .values()
            .map(|m| m.target_id().to_string())
            .collect()
    }

    fn loaded_ids(model: &TargetModel) -> Vec<String> {
        model
            .all_loaded_targets()
            .into_iter()
            .map(|t| t.id.to_string())
            .collect()
    }

    #[test]
    fn enabling_grouping_drops_modules_of_discarded_state() {
        let dir = TempDir::new().unwrap();
        Project::init(dir.path()).unwrap();
        write_model_config(dir.path(), "directory_grouping = false");

        let path = dir.path().join("targets.json");
        fs::write(
            &path,
            r#"{
                "targets": [{"id": "//a"}, {"id": "//b"}],
                "sources": [
                    {"target": "//a", "sources": [{"uri": "file:///src/A.java", "kind": "FILE"}]},
                    {"target": "//b", "sources": [{"uri": "file:///src/B.java", "kind": "FILE"}]}
                ]
            }"#,
        )
        .unwrap();

        let project = Project::open(dir.path()).unwrap();
        project.import_snapshot(&path).unwrap();
        let mut model = project.open_model().unwrap();
        let diff = model.load_default_targets();
        project.commit(&model, Some(diff)).unwrap();
        assert_eq!(module_targets(&project), vec!["//a", "//b"]);

        // Sibling files now overlap, so the saved state loads a conflicting pair
        write_model_config(dir.path(), "directory_grouping = true");
        let project = Project::open(dir.path()).unwrap();
        let mut model = project.open_model().unwrap();
        assert!(!model.is_initialized());
        assert!(project.module_store().unwrap().is_empty());

        let diff = model.load_default_targets();
        project.commit(&model, Some(diff)).unwrap();
        assert_eq!(loaded_ids(&model), vec!["//a"]);
        assert_eq!(module_targets(&project), loaded_ids(&model));
    }

    #[test]
    fn renamed_modules_are_removed_by_target() {
        let (dir, project) = project_with_snapshot();

        let mut model = project.open_model().unwrap();
        let diff = model.load_target(&TargetId::new("//a")).unwrap();
        project.commit(&model, diff).unwrap();

        write_model_config(dir.path(), "module_naming = \"sanitized\"");
        let project = Project::open(dir.path()).unwrap();
        let mut model = project.open_model().unwrap();
        assert_eq!(loaded_ids(&model), vec!["//a"]);

        let diff = model.load_target(&TargetId::new("//b")).unwrap();
        project.commit(&model, diff).unwrap();

        let store = project.module_store().unwrap();
        let names: Vec<_> = store.modules().keys().cloned().collect();
        assert_eq!(names, vec!["b"]);
        assert_eq!(module_targets(&project), vec!["//b"]);
    }
}
