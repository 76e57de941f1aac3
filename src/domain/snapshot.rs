//! Project snapshot
//!
//! Everything the build tool reported in one sync, fixed for the lifetime of a
//! model. The order of `targets` is the canonical target order used for every
//! order-sensitive computation and listing.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::{DocumentId, TargetId};
use super::target::{
    BuildTarget, DependencySourcesItem, JavacOptionsItem, LibraryItem, PythonOptionsItem,
    ResourcesItem, SourcesItem,
};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Duplicate target in snapshot: {0}")]
    DuplicateTarget(TargetId),

    #[error("{kind} item refers to unknown target: {target}")]
    UnknownTarget { kind: &'static str, target: TargetId },

    #[error("Failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// An immutable snapshot of target metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    pub targets: Vec<BuildTarget>,

    #[serde(default)]
    pub sources: Vec<SourcesItem>,

    #[serde(default)]
    pub resources: Vec<ResourcesItem>,

    #[serde(default)]
    pub dependency_sources: Vec<DependencySourcesItem>,

    #[serde(default)]
    pub javac_options: Vec<JavacOptionsItem>,

    #[serde(default)]
    pub python_options: Vec<PythonOptionsItem>,

    #[serde(default)]
    pub output_path_uris: Vec<DocumentId>,

    #[serde(default)]
    pub libraries: Vec<LibraryItem>,
}

impl ProjectSnapshot {
    /// Creates a snapshot from targets and their sources
    pub fn new(targets: Vec<BuildTarget>, sources: Vec<SourcesItem>) -> Self {
        Self {
            targets,
            sources,
            ..Self::default()
        }
    }

    /// Returns the target ids in canonical order
    pub fn target_ids(&self) -> impl Iterator<Item = &TargetId> {
        self.targets.iter().map(|t| &t.id)
    }

    /// Checks that target ids are unique and every item refers to a known target
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let mut seen = HashSet::with_capacity(self.targets.len());
        for target in &self.targets {
            if !seen.insert(&target.id) {
                return Err(SnapshotError::DuplicateTarget(target.id.clone()));
            }
        }

        let check = |kind: &'static str, target: &TargetId| {
            if seen.contains(target) {
                Ok(())
            } else {
                Err(SnapshotError::UnknownTarget {
                    kind,
                    target: target.clone(),
                })
            }
        };

        for item in &self.sources {
            check("Sources", &item.target)?;
        }
        for item in &self.resources {
            check("Resources", &item.target)?;
        }
        for item in &self.dependency_sources {
            check("Dependency sources", &item.target)?;
        }
        for item in &self.javac_options {
            check("Javac options", &item.target)?;
        }
        for item in &self.python_options {
            check("Python options", &item.target)?;
        }

        Ok(())
    }

    /// Returns a stable hash of the snapshot contents
    ///
    /// Used to tell whether persisted load state belongs to this snapshot.
    pub fn fingerprint(&self) -> Result<String, SnapshotError> {
        let mut hasher = blake3::Hasher::new();
        serde_json::to_writer(&mut hasher, self)?;
        Ok(hasher.finalize().to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::target::SourceItem;

    fn target(id: &str) -> BuildTarget {
        BuildTarget::new(TargetId::new(id))
    }

    #[test]
    fn validate_accepts_well_formed_snapshot() {
        let snapshot = ProjectSnapshot::new(
            vec![target("//a"), target("//b")],
            vec![SourcesItem::new(
                TargetId::new("//a"),
                vec![SourceItem::file("file:///a.java")],
            )],
        );

        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_targets() {
        let snapshot = ProjectSnapshot::new(vec![target("//a"), target("//a")], vec![]);

        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::DuplicateTarget(id)) if id == TargetId::new("//a")
        ));
    }

    #[test]
    fn validate_rejects_sources_for_unknown_target() {
        let snapshot = ProjectSnapshot::new(
            vec![target("//a")],
            vec![SourcesItem::new(
                TargetId::new("//ghost"),
                vec![SourceItem::file("file:///g.java")],
            )],
        );

        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::UnknownTarget { .. })
        ));
    }

    #[test]
    fn dangling_dependencies_are_valid() {
        let snapshot = ProjectSnapshot::new(
            vec![target("//a").with_dependency(TargetId::new("@maven//:guava"))],
            vec![],
        );

        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = ProjectSnapshot::new(vec![target("//a")], vec![]);
        let b = ProjectSnapshot::new(vec![target("//b")], vec![]);

        assert_eq!(a.fingerprint().unwrap(), a.clone().fingerprint().unwrap());
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn snapshot_json_round_trip() {
        let mut snapshot = ProjectSnapshot::new(
            vec![target("//a").with_dependency(TargetId::new("//b")), target("//b")],
            vec![SourcesItem::new(
                TargetId::new("//a"),
                vec![SourceItem::directory("file:///repo/a/")],
            )],
        );
        snapshot.output_path_uris.push(DocumentId::new("file:///repo/bazel-out"));

        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: ProjectSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, snapshot);
    }
}
