//! Build target model
//!
//! Immutable value types describing what the build tool reported for a
//! workspace: targets, their source items and the auxiliary per-target items
//! needed to materialize a project module. Field names follow the Build
//! Server Protocol's camelCase JSON encoding.

use serde::{Deserialize, Serialize};

use super::id::{DocumentId, TargetId};

/// What a build target can be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildTargetCapabilities {
    pub can_compile: bool,
    pub can_test: bool,
    pub can_run: bool,
    pub can_debug: bool,
}

/// A buildable unit reported by the build tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTarget {
    /// Stable target label
    pub id: TargetId,

    /// Human-readable name, if the build tool provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Directory the target is declared in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_directory: Option<DocumentId>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub language_ids: Vec<String>,

    /// Direct dependencies, in declaration order
    ///
    /// May reference targets (or libraries) absent from the snapshot.
    #[serde(default)]
    pub dependencies: Vec<TargetId>,

    #[serde(default)]
    pub capabilities: BuildTargetCapabilities,

    /// Kind of the build-tool specific `data` payload (e.g., `jvm`, `python`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_kind: Option<String>,

    /// Opaque build-tool metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl BuildTarget {
    /// Creates a target with no metadata
    pub fn new(id: TargetId) -> Self {
        Self {
            id,
            display_name: None,
            base_directory: None,
            tags: vec![],
            language_ids: vec![],
            dependencies: vec![],
            capabilities: BuildTargetCapabilities::default(),
            data_kind: None,
            data: None,
        }
    }

    /// Adds a dependency (builder style)
    pub fn with_dependency(mut self, dependency: TargetId) -> Self {
        if !self.dependencies.contains(&dependency) {
            self.dependencies.push(dependency);
        }
        self
    }

    /// Adds a language id (builder style)
    pub fn with_language(mut self, language_id: impl Into<String>) -> Self {
        self.language_ids.push(language_id.into());
        self
    }

    /// Returns the display name, falling back to the target id
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(self.id.as_str())
    }
}

/// Whether a source item is a single file or a whole directory tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceItemKind {
    /// Matches only the declared document
    File,
    /// Matches the declared document and everything nested under it
    Directory,
}

/// A file or directory declared as part of a target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceItem {
    pub uri: DocumentId,
    pub kind: SourceItemKind,
    #[serde(default)]
    pub generated: bool,
}

impl SourceItem {
    #[cfg(test)]
    pub(crate) fn file(uri: impl Into<String>) -> Self {
        Self {
            uri: DocumentId::new(uri),
            kind: SourceItemKind::File,
            generated: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn directory(uri: impl Into<String>) -> Self {
        Self {
            uri: DocumentId::new(uri),
            kind: SourceItemKind::Directory,
            generated: false,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == SourceItemKind::Directory
    }
}

/// The source items of one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcesItem {
    pub target: TargetId,
    pub sources: Vec<SourceItem>,
    /// Package roots reported by the build tool
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roots: Vec<DocumentId>,
}

impl SourcesItem {
    pub fn new(target: TargetId, sources: Vec<SourceItem>) -> Self {
        Self {
            target,
            sources,
            roots: vec![],
        }
    }
}

/// Resource files of one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesItem {
    pub target: TargetId,
    pub resources: Vec<DocumentId>,
}

/// Source jars/directories of a target's external dependencies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencySourcesItem {
    pub target: TargetId,
    pub sources: Vec<DocumentId>,
}

/// Java compiler options of one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavacOptionsItem {
    pub target: TargetId,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub classpath: Vec<String>,
    #[serde(default)]
    pub class_directory: String,
}

/// Python interpreter options of one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PythonOptionsItem {
    pub target: TargetId,
    #[serde(default)]
    pub interpreter_options: Vec<String>,
}

/// An external library that targets may depend on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryItem {
    pub id: TargetId,
    #[serde(default)]
    pub dependencies: Vec<TargetId>,
    #[serde(default)]
    pub jars: Vec<String>,
    #[serde(default)]
    pub source_jars: Vec<String>,
}
