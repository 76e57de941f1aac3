//! Document ownership index
//!
//! Maps documents to the targets that claim them. A target claims a document
//! when one of its source items
//! - is a `FILE` item with the same URI,
//! - is a `DIRECTORY` item equal to or containing the document, or
//! - falls under the [`DirectoryGrouping`] policy for that directory.
//!
//! Owners are always reported in canonical (snapshot) target order.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::id::{DocumentId, TargetId};
use super::snapshot::ProjectSnapshot;
use super::target::{SourceItem, SourceItemKind};

/// Directory-grouping overlap policy
///
/// Hosts that assign content roots per directory cannot let two modules own
/// files in the same directory. With grouping enabled, every `FILE` item also
/// claims its containing directory, so two targets with sibling files end up
/// owning that directory together and therefore overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryGrouping {
    #[default]
    Enabled,
    Disabled,
}

impl DirectoryGrouping {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            DirectoryGrouping::Enabled
        } else {
            DirectoryGrouping::Disabled
        }
    }

    pub fn is_enabled(self) -> bool {
        self == DirectoryGrouping::Enabled
    }

    /// Returns the directory through which `item` conflicts with sibling files
    /// of other targets, if any
    pub fn grouping_key(self, item: &SourceItem) -> Option<DocumentId> {
        match (self, item.kind) {
            (DirectoryGrouping::Enabled, SourceItemKind::File) => item.uri.parent(),
            _ => None,
        }
    }
}

/// Index from documents to owning targets
#[derive(Debug, Default)]
pub struct SourceIndex {
    /// Canonical position of every target in the snapshot
    order: HashMap<TargetId, usize>,

    /// `FILE` items, keyed by trimmed URI
    files: HashMap<DocumentId, Vec<TargetId>>,

    /// `DIRECTORY` items, keyed by trimmed URI
    directories: HashMap<DocumentId, Vec<TargetId>>,

    /// Grouping keys (containing directories of `FILE` items)
    groups: HashMap<DocumentId, Vec<TargetId>>,

    /// Literal declared URIs, deduplicated, in first-declaration order
    declared: Vec<DocumentId>,

    /// Literal declared URIs per target
    by_target: HashMap<TargetId, Vec<DocumentId>>,

    grouping: DirectoryGrouping,
}

impl SourceIndex {
    /// Builds the index from a snapshot's source items
    pub fn build(snapshot: &ProjectSnapshot, grouping: DirectoryGrouping) -> Self {
        let mut index = Self {
            order: snapshot
                .target_ids()
                .enumerate()
                .map(|(i, id)| (id.clone(), i))
                .collect(),
            grouping,
            ..Self::default()
        };

        let mut seen = HashSet::new();
        for item in &snapshot.sources {
            for source in &item.sources {
                index.insert(&item.target, source);

                if seen.insert(source.uri.clone()) {
                    index.declared.push(source.uri.clone());
                }
            }
        }

        index
    }

    fn insert(&mut self, target: &TargetId, source: &SourceItem) {
        let key = source.uri.trimmed();
        let bucket = match source.kind {
            SourceItemKind::File => &mut self.files,
            SourceItemKind::Directory => &mut self.directories,
        };
        push_unique(bucket.entry(key).or_default(), target);

        if let Some(group) = self.grouping.grouping_key(source) {
            push_unique(self.groups.entry(group).or_default(), target);
        }

        let documents = self.by_target.entry(target.clone()).or_default();
        if !documents.contains(&source.uri) {
            documents.push(source.uri.clone());
        }
    }

    /// Returns every target whose source items cover `document`
    pub fn owners(&self, document: &DocumentId) -> Vec<&TargetId> {
        let key = document.trimmed();

        let candidates = [self.files.get(&key), self.directories.get(&key)]
            .into_iter()
            .chain(key.ancestors().map(|dir| self.directories.get(&dir)))
            .chain(std::iter::once(self.groups.get(&key)));

        let mut owners: Vec<&TargetId> = Vec::new();
        for target in candidates.flatten().flatten() {
            if !owners.contains(&target) {
                owners.push(target);
            }
        }

        owners.sort_by_key(|id| self.order.get(*id).copied().unwrap_or(usize::MAX));
        owners
    }

    /// Returns the literal declared documents
    ///
    /// Each call starts a fresh iteration; nothing is expanded from disk.
    pub fn all_documents(&self) -> impl Iterator<Item = &DocumentId> + '_ {
        self.declared.iter()
    }

    /// Returns the documents declared by one target
    pub fn documents_of(&self, target: &TargetId) -> &[DocumentId] {
        self.by_target
            .get(target)
            .map(|docs| docs.as_slice())
            .unwrap_or(&[])
    }

    /// Returns every document key that can produce an overlap: declared items
    /// plus grouping directories
    pub fn indexed_documents(&self) -> impl Iterator<Item = &DocumentId> + '_ {
        self.files
            .keys()
            .chain(self.directories.keys())
            .chain(self.groups.keys())
    }

    /// Returns targets with at least one source item, in canonical order
    pub fn targets_with_sources(&self) -> Vec<&TargetId> {
        let mut targets: Vec<_> = self.by_target.keys().collect();
        targets.sort_by_key(|id| self.order.get(*id).copied().unwrap_or(usize::MAX));
        targets
    }

    /// Returns true if the target declares at least one source item
    pub fn has_sources(&self, target: &TargetId) -> bool {
        self.by_target.contains_key(target)
    }

    pub fn grouping(&self) -> DirectoryGrouping {
        self.grouping
    }
}

fn push_unique(targets: &mut Vec<TargetId>, target: &TargetId) {
    if !targets.contains(target) {
        targets.push(target.clone());
    }
}
