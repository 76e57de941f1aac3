//! Deferred project-model changes
//!
//! A [`ChangeDiff`] describes which modules the host project model must add
//! and remove to match the engine's load state. It is plain data: the engine
//! has already updated its own state by the time a diff exists, and nothing
//! happens until the caller hands it to a [`ProjectModelUpdater`].

use serde::{Deserialize, Serialize};

use super::id::{DocumentId, TargetId};
use super::target::{BuildTarget, JavacOptionsItem, LibraryItem, PythonOptionsItem, SourceItem};

/// How module names are derived from target ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleNaming {
    /// The module name is the target id verbatim
    #[default]
    TargetId,
    /// Leading `@` and `/` are stripped; `/` and `:` become `.`
    ///
    /// `//app/src:lib` -> `app.src.lib`, `@maven//:guava` -> `maven...guava`
    Sanitized,
}

impl ModuleNaming {
    pub fn module_name(self, target: &TargetId) -> String {
        match self {
            ModuleNaming::TargetId => target.to_string(),
            ModuleNaming::Sanitized => target
                .as_str()
                .trim_start_matches(['@', '/'])
                .replace(['/', ':'], "."),
        }
    }
}

/// Everything needed to materialize one target as a project module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDetails {
    pub module_name: String,
    pub target: BuildTarget,

    #[serde(default)]
    pub sources: Vec<SourceItem>,

    #[serde(default)]
    pub roots: Vec<DocumentId>,

    #[serde(default)]
    pub resources: Vec<DocumentId>,

    #[serde(default)]
    pub dependency_sources: Vec<DocumentId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub javac_options: Option<JavacOptionsItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_options: Option<PythonOptionsItem>,

    /// Libraries among the target's direct dependencies
    #[serde(default)]
    pub libraries: Vec<LibraryItem>,
}

impl ModuleDetails {
    pub fn target_id(&self) -> &TargetId {
        &self.target.id
    }
}

/// A module to drop from the project model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedModule {
    pub target: TargetId,
    pub module_name: String,
}

/// An ordered batch of module additions and removals
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDiff {
    pub modules_to_add: Vec<ModuleDetails>,
    pub modules_to_remove: Vec<RemovedModule>,
}

impl ChangeDiff {
    pub fn is_empty(&self) -> bool {
        self.modules_to_add.is_empty() && self.modules_to_remove.is_empty()
    }

    /// Returns the ids of added targets, in diff order
    pub fn added(&self) -> impl Iterator<Item = &TargetId> {
        self.modules_to_add.iter().map(|m| m.target_id())
    }

    /// Returns the ids of removed targets, in diff order
    pub fn removed(&self) -> impl Iterator<Item = &TargetId> {
        self.modules_to_remove.iter().map(|m| &m.target)
    }

    /// Applies the diff, removals first
    ///
    /// Consumes the diff so it cannot be applied twice. A failure leaves the
    /// updater partially updated; the engine state is not rolled back.
    pub fn apply_on<U: ProjectModelUpdater>(self, updater: &mut U) -> Result<(), U::Error> {
        if !self.modules_to_remove.is_empty() {
            updater.remove_modules(self.modules_to_remove)?;
        }
        if !self.modules_to_add.is_empty() {
            updater.add_modules(self.modules_to_add)?;
        }
        Ok(())
    }
}

/// The host project model, as seen by the engine
pub trait ProjectModelUpdater {
    type Error;

    fn remove_modules(&mut self, modules: Vec<RemovedModule>) -> Result<(), Self::Error>;

    fn add_modules(&mut self, modules: Vec<ModuleDetails>) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        fail_on_add: bool,
    }

    impl ProjectModelUpdater for Recorder {
        type Error = String;

        fn remove_modules(&mut self, modules: Vec<RemovedModule>) -> Result<(), String> {
            for m in modules {
                self.calls.push(format!("-{}", m.module_name));
            }
            Ok(())
        }

        fn add_modules(&mut self, modules: Vec<ModuleDetails>) -> Result<(), String> {
            if self.fail_on_add {
                return Err("host rejected modules".to_string());
            }
            for m in modules {
                self.calls.push(format!("+{}", m.module_name));
            }
            Ok(())
        }
    }

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

    fn removal(id: &str) -> RemovedModule {
        RemovedModule {
            target: TargetId::new(id),
            module_name: id.to_string(),
        }
    }

    #[test]
    fn module_naming() {
        let id = TargetId::new("//app/src:lib");
        assert_eq!(ModuleNaming::TargetId.module_name(&id), "//app/src:lib");
        assert_eq!(ModuleNaming::Sanitized.module_name(&id), "app.src.lib");
        assert_eq!(
            ModuleNaming::Sanitized.module_name(&TargetId::new("@maven//:guava")),
            "maven...guava"
        );
    }

    #[test]
    fn apply_removes_before_adding() {
        let diff = ChangeDiff {
            modules_to_add: vec![details("//a")],
            modules_to_remove: vec![removal("//b"), removal("//c")],
        };
        let mut recorder = Recorder::default();

        diff.apply_on(&mut recorder).unwrap();
        assert_eq!(recorder.calls, vec!["-//b", "-//c", "+//a"]);
    }

    #[test]
    fn apply_surfaces_updater_errors() {
        let diff = ChangeDiff {
            modules_to_add: vec![details("//a")],
            modules_to_remove: vec![removal("//b")],
        };
        let mut recorder = Recorder {
            fail_on_add: true,
            ..Recorder::default()
        };

        let err = diff.apply_on(&mut recorder).unwrap_err();
        assert_eq!(err, "host rejected modules");
        assert_eq!(recorder.calls, vec!["-//b"]);
    }

    #[test]
    fn empty_diff_makes_no_calls() {
        let diff = ChangeDiff::default();
        assert!(diff.is_empty());

        let mut recorder = Recorder::default();
        diff.apply_on(&mut recorder).unwrap();
        assert!(recorder.calls.is_empty());
    }
}
