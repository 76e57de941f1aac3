//! Materialized module set
//!
//! `.targetmap/modules.json` stands in for the host project model: it holds
//! one entry per loaded module, keyed by module name, and is updated by
//! applying [`ChangeDiff`](crate::domain::ChangeDiff)s to a [`ModuleStore`].
//! Modules are matched to removals by target, so a module survives a change of
//! naming scheme only until its target is unloaded or loaded again.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::config::DATA_DIR;
use super::json_file::JsonFile;
use crate::domain::{ModuleDetails, ProjectModelUpdater, RemovedModule, TargetId};

pub struct ModuleStore {
    file: JsonFile<BTreeMap<String, ModuleDetails>>,
    modules: BTreeMap<String, ModuleDetails>,
}

impl ModuleStore {
    /// Opens the store, reading existing modules
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let file = JsonFile::new(path);
        let modules = file.read()?.unwrap_or_default();
        Ok(Self { file, modules })
    }

    /// Opens the default store for a project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        Self::open(project_root.join(DATA_DIR).join("modules.json"))
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn modules(&self) -> &BTreeMap<String, ModuleDetails> {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Removes the modules materialized for `target`, whatever their name
    ///
    /// Returns the number of modules removed.
    fn remove_target(&mut self, target: &TargetId) -> usize {
        let before = self.modules.len();
        self.modules.retain(|_, module| module.target_id() != target);
        before - self.modules.len()
    }

    /// Drops every module and deletes the file
    pub fn reset(&mut self) -> Result<()> {
        self.modules.clear();
        self.file.remove()?;
        Ok(())
    }
}

impl ProjectModelUpdater for ModuleStore {
    type Error = anyhow::Error;

    fn remove_modules(&mut self, modules: Vec<RemovedModule>) -> Result<()> {
        for module in modules {
            if self.remove_target(&module.target) == 0 {
                tracing::warn!(
                    target_id = %module.target,
                    module = %module.module_name,
                    "module to remove is not materialized"
                );
            }
        }
        self.file.write(&self.modules)
    }

    fn add_modules(&mut self, modules: Vec<ModuleDetails>) -> Result<()> {
        for module in modules {
            self.remove_target(module.target_id());
            self.modules.insert(module.module_name.clone(), module);
        }
        self.file.write(&self.modules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BuildTarget, ChangeDiff};
    use tempfile::TempDir;

    fn details(id: &str) -> ModuleDetails {
        ModuleDetails {
            module_name: id.to_string(),
            target: BuildTarget::new(TargetId::new(id)),
            sources: vec![],
            roots: vec![],
            resources: vec![],
            dependency_sources: vec![],
            javac_options: None,
            python_options: None,
            libraries: vec![],
        }
    }

    #[test]
    fn applies_diffs_and_persists() {
        let dir = TempDir::new().unwrap();
        let mut store = ModuleStore::for_project(dir.path()).unwrap();
        assert!(store.is_empty());

        ChangeDiff {
            modules_to_add: vec![details("//a"), details("//b")],
            modules_to_remove: vec![],
        }
        .apply_on(&mut store)
        .unwrap();

        ChangeDiff {
            modules_to_add: vec![details("//c")],
            modules_to_remove: vec![RemovedModule {
                target: TargetId::new("//a"),
                module_name: "//a".to_string(),
            }],
        }
        .apply_on(&mut store)
        .unwrap();

        let reopened = ModuleStore::for_project(dir.path()).unwrap();
        let names: Vec<_> = reopened.modules().keys().cloned().collect();
        assert_eq!(names, vec!["//b", "//c"]);
    }

    #[test]
    fn removal_matches_target_not_name() {
        let dir = TempDir::new().unwrap();
        let mut store = ModuleStore::for_project(dir.path()).unwrap();
        let mut renamed = details("//app:lib");
        renamed.module_name = "app.lib".to_string();
        store.add_modules(vec![details("//app:lib")]).unwrap();

        // Re-adding under a new name replaces the old entry
        store.add_modules(vec![renamed]).unwrap();
        let names: Vec<_> = store.modules().keys().cloned().collect();
        assert_eq!(names, vec!["app.lib"]);

        store
            .remove_modules(vec![RemovedModule {
                target: TargetId::new("//app:lib"),
                module_name: "//app:lib".to_string(),
            }])
            .unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn removing_unknown_module_is_tolerated() {
        let dir = TempDir::new().unwrap();
        let mut store = ModuleStore::for_project(dir.path()).unwrap();

        store
            .remove_modules(vec![RemovedModule {
                target: TargetId::new("//ghost"),
                module_name: "//ghost".to_string(),
            }])
            .unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn reset_clears_everything() {
        let dir = TempDir::new().unwrap();
        let mut store = ModuleStore::for_project(dir.path()).unwrap();
        store.add_modules(vec![details("//a")]).unwrap();
        assert_eq!(store.len(), 1);

        store.reset().unwrap();
        assert!(store.is_empty());
        assert!(!store.path().exists());
    }
}
