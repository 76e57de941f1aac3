//! Identifiers for build targets and documents
//!
//! Both are opaque strings compared by value:
//! - Target IDs: build tool labels or URIs (e.g., `//app/src:lib`, `@maven//:guava`)
//! - Document IDs: source URIs or paths (e.g., `file:///repo/app/src/Main.java`)
//!
//! Empty identifiers are rejected at parse time so every value in a snapshot
//! can be used as a map key without further checks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid target ID: expected a non-empty label, got '{0}'")]
    InvalidTargetId(String),

    #[error("Invalid document ID: expected a non-empty URI or path, got '{0}'")]
    InvalidDocumentId(String),
}

/// Build target identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetId(String);

impl TargetId {
    /// Creates a target ID from a literal label
    ///
    /// Use `parse` for labels read from input.
    ///
    /// # Panics
    ///
    /// Panics if the label is empty or whitespace.
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        match label.parse() {
            Ok(id) => id,
            Err(e) => panic!("{}", e),
        }
    }

    /// Returns the raw label
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TargetId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdError::InvalidTargetId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for TargetId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TargetId> for String {
    fn from(id: TargetId) -> Self {
        id.0
    }
}

/// Document identifier (a source file or directory URI)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    /// Creates a document ID from a literal URI
    ///
    /// Use `parse` for URIs read from input.
    ///
    /// # Panics
    ///
    /// Panics if the URI is empty or whitespace.
    pub fn new(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        match uri.parse() {
            Ok(id) => id,
            Err(e) => panic!("{}", e),
        }
    }

    /// Returns the raw URI
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns this document with any trailing `/` removed
    ///
    /// Directory items are often declared as `file:///dir/`; containment checks
    /// compare against the trimmed form. Root-like URIs (`/`, `file:///`) are
    /// returned unchanged.
    pub fn trimmed(&self) -> DocumentId {
        let trimmed = self.0.trim_end_matches('/');
        if trimmed.is_empty() || trimmed.ends_with(':') || trimmed.ends_with(":/") {
            return self.clone();
        }
        DocumentId(trimmed.to_string())
    }

    /// Returns the containing directory, or None for a root or a bare name
    ///
    /// `file:///repo/src/Main.java` -> `file:///repo/src`, and top-level
    /// documents belong to the root: `file:///Main.java` -> `file:///`,
    /// `/Main.java` -> `/`.
    pub fn parent(&self) -> Option<DocumentId> {
        let path = self.0.trim_end_matches('/');
        let idx = path.rfind('/')?;
        let parent = &path[..idx];
        if parent.is_empty() || parent.ends_with('/') || parent.ends_with(':') {
            return Some(DocumentId(path[..=idx].to_string()));
        }
        Some(DocumentId(parent.to_string()))
    }

    /// Returns true if this document equals `dir` or is nested under it
    pub fn is_within(&self, dir: &DocumentId) -> bool {
        let dir = dir.0.trim_end_matches('/');
        let this = self.0.trim_end_matches('/');
        if dir.is_empty() {
            // `/` contains every absolute path
            return self.0.starts_with('/');
        }
        this == dir
            || (this.len() > dir.len()
                && this.starts_with(dir)
                && this.as_bytes()[dir.len()] == b'/')
    }

    /// Iterates over all ancestors, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = DocumentId> {
        std::iter::successors(self.parent(), |dir| dir.parent())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DocumentId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdError::InvalidDocumentId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for DocumentId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}
