//! Target model
//!
//! Owns one [`ProjectSnapshot`] together with everything derived from it and
//! the current load state. All mutations update the load state first and then
//! describe the change as a [`ChangeDiff`]; the model never talks to the host
//! project model itself.
//!
//! Invariant: no two loaded targets overlap. Every mutation below evicts
//! loaded conflicts before loading a target, and restored state is checked
//! before it is accepted.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::diff::{ChangeDiff, ModuleDetails, ModuleNaming, RemovedModule};
use super::id::{DocumentId, TargetId};
use super::load_state::LoadStateStore;
use super::overlap::OverlapGraph;
use super::selection::{default_selection, SelectionPolicy};
use super::snapshot::{ProjectSnapshot, SnapshotError};
use super::source_index::{DirectoryGrouping, SourceIndex};
use super::target::BuildTarget;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Unknown target: {0}")]
    UnknownTarget(TargetId),

    #[error("Saved state belongs to another snapshot (expected {expected}, found {found})")]
    StaleState { expected: String, found: String },

    #[error("Saved state loads overlapping targets {0} and {1}")]
    ConflictingState(TargetId, TargetId),

    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Policies fixed for the lifetime of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModelSettings {
    pub selection: SelectionPolicy,
    pub directory_grouping: DirectoryGrouping,
    pub module_naming: ModuleNaming,
}

/// Which targets claim a document, split by load state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTargetsDetails {
    pub loaded_target: Option<TargetId>,
    pub not_loaded_targets: Vec<TargetId>,
}

/// Serializable load state of a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelState {
    /// Fingerprint of the snapshot this state was taken from
    pub snapshot: String,

    /// Loaded targets in snapshot order; None before the first load
    pub loaded: Option<Vec<TargetId>>,
}

#[derive(Debug)]
pub struct TargetModel {
    snapshot: ProjectSnapshot,
    settings: ModelSettings,
    fingerprint: String,
    positions: HashMap<TargetId, usize>,
    index: SourceIndex,
    overlaps: OnceLock<OverlapGraph>,
    defaults: OnceLock<Vec<TargetId>>,
    state: LoadStateStore,
}

impl TargetModel {
    /// Validates the snapshot and indexes its sources
    pub fn new(snapshot: ProjectSnapshot, settings: ModelSettings) -> Result<Self, ModelError> {
        snapshot.validate()?;
        let fingerprint = snapshot.fingerprint()?;
        let positions = snapshot
            .target_ids()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        let index = SourceIndex::build(&snapshot, settings.directory_grouping);

        tracing::debug!(
            targets = snapshot.targets.len(),
            documents = index.all_documents().count(),
            grouping = settings.directory_grouping.is_enabled(),
            "indexed snapshot"
        );

        Ok(Self {
            snapshot,
            settings,
            fingerprint,
            positions,
            index,
            overlaps: OnceLock::new(),
            defaults: OnceLock::new(),
            state: LoadStateStore::new(),
        })
    }

    /// Builds a model and restores previously saved load state
    pub fn from_state(
        snapshot: ProjectSnapshot,
        settings: ModelSettings,
        state: ModelState,
    ) -> Result<Self, ModelError> {
        let mut model = Self::new(snapshot, settings)?;
        model.restore(state)?;
        Ok(model)
    }

    pub fn snapshot(&self) -> &ProjectSnapshot {
        &self.snapshot
    }

    pub fn settings(&self) -> ModelSettings {
        self.settings
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn contains(&self, id: &TargetId) -> bool {
        self.positions.contains_key(id)
    }

    pub fn target(&self, id: &TargetId) -> Option<&BuildTarget> {
        self.positions.get(id).map(|&i| &self.snapshot.targets[i])
    }

    /// Returns the overlap graph, building it on first use
    pub fn overlap_graph(&self) -> &OverlapGraph {
        self.overlaps.get_or_init(|| OverlapGraph::build(&self.index))
    }

    /// Returns the default selection, computing it on first use
    pub fn default_selection(&self) -> &[TargetId] {
        self.defaults.get_or_init(|| {
            default_selection(
                &self.snapshot.targets,
                self.overlap_graph(),
                self.settings.selection,
            )
        })
    }

    /// Returns the declared documents of all targets
    pub fn all_documents(&self) -> impl Iterator<Item = &DocumentId> + '_ {
        self.index.all_documents()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_initialized()
    }

    pub fn is_loaded(&self, id: &TargetId) -> bool {
        self.state.is_loaded(id)
    }

    /// Returns loaded targets in snapshot order
    pub fn all_loaded_targets(&self) -> Vec<&BuildTarget> {
        self.snapshot
            .targets
            .iter()
            .filter(|t| self.state.is_loaded(&t.id))
            .collect()
    }

    /// Returns targets that are not loaded, in snapshot order
    pub fn all_not_loaded_targets(&self) -> Vec<&BuildTarget> {
        self.snapshot
            .targets
            .iter()
            .filter(|t| !self.state.is_loaded(&t.id))
            .collect()
    }

    /// Replaces the loaded set with the default selection
    pub fn load_default_targets(&mut self) -> ChangeDiff {
        let before = self.state.loaded();
        let defaults: BTreeSet<TargetId> = self.default_selection().iter().cloned().collect();
        self.state.replace(defaults);

        let diff = self.diff_from(&before);
        tracing::debug!(
            added = diff.modules_to_add.len(),
            removed = diff.modules_to_remove.len(),
            "loaded default targets"
        );
        diff
    }

    /// Loads a target, unloading every loaded target it overlaps with
    ///
    /// Returns `Ok(None)` if the target is already loaded.
    pub fn load_target(&mut self, id: &TargetId) -> Result<Option<ChangeDiff>, ModelError> {
        self.ensure_known(id)?;
        if self.state.is_loaded(id) {
            tracing::debug!(target_id = %id, "target already loaded");
            return Ok(None);
        }

        let before = self.state.loaded();
        self.load_evicting(id);

        let diff = self.diff_from(&before);
        tracing::debug!(
            target_id = %id,
            evicted = diff.modules_to_remove.len(),
            "loaded target"
        );
        Ok(Some(diff))
    }

    /// Loads a target and its transitive dependencies
    ///
    /// Dependencies are visited breadth first. Ids missing from the snapshot
    /// and ids overlapping a target accepted earlier in the same walk are
    /// skipped. Accepted targets that are already loaded stay as they are.
    /// Returns `Ok(None)` if the root is already loaded, in which case its
    /// dependencies are not walked, or if nothing changed.
    pub fn load_target_with_dependencies(
        &mut self,
        id: &TargetId,
    ) -> Result<Option<ChangeDiff>, ModelError> {
        self.ensure_known(id)?;
        if self.state.is_loaded(id) {
            tracing::debug!(target_id = %id, "target already loaded");
            return Ok(None);
        }

        let accepted = self.dependency_closure(id);
        let before = self.state.loaded();
        for target in &accepted {
            if !self.state.is_loaded(target) {
                self.load_evicting(target);
            }
        }

        let diff = self.diff_from(&before);
        tracing::debug!(
            target_id = %id,
            accepted = accepted.len(),
            added = diff.modules_to_add.len(),
            removed = diff.modules_to_remove.len(),
            "loaded target with dependencies"
        );
        Ok((!diff.is_empty()).then_some(diff))
    }

    /// Unloads a target without loading anything in its place
    ///
    /// Returns `Ok(None)` if the target is not loaded.
    pub fn unload_target(&mut self, id: &TargetId) -> Result<Option<ChangeDiff>, ModelError> {
        self.ensure_known(id)?;
        if !self.state.unload(id) {
            return Ok(None);
        }

        tracing::debug!(target_id = %id, "unloaded target");
        Ok(Some(ChangeDiff {
            modules_to_add: vec![],
            modules_to_remove: vec![self.removed_module(id)],
        }))
    }

    /// Unloads everything and returns to the uninitialized state
    pub fn clear(&mut self) -> ChangeDiff {
        let before = self.state.clear();
        let diff = self.diff_from(&before);
        tracing::debug!(removed = diff.modules_to_remove.len(), "cleared load state");
        diff
    }

    /// Returns the loaded owner and the other owners of a document
    ///
    /// Unknown documents have no owners.
    pub fn targets_details_for_document(&self, document: &DocumentId) -> DocumentTargetsDetails {
        let mut details = DocumentTargetsDetails::default();
        for owner in self.index.owners(document) {
            if details.loaded_target.is_none() && self.state.is_loaded(owner) {
                details.loaded_target = Some(owner.clone());
            } else {
                details.not_loaded_targets.push(owner.clone());
            }
        }
        details
    }

    /// Collects what the host needs to materialize `id` as a module
    pub fn module_details(&self, id: &TargetId) -> Option<ModuleDetails> {
        let target = self.target(id)?;
        let snapshot = &self.snapshot;

        let (sources, roots) = snapshot
            .sources
            .iter()
            .filter(|item| &item.target == id)
            .fold((vec![], vec![]), |(mut sources, mut roots), item| {
                sources.extend(item.sources.iter().cloned());
                roots.extend(item.roots.iter().cloned());
                (sources, roots)
            });

        Some(ModuleDetails {
            module_name: self.settings.module_naming.module_name(id),
            target: target.clone(),
            sources,
            roots,
            resources: snapshot
                .resources
                .iter()
                .filter(|item| &item.target == id)
                .flat_map(|item| item.resources.iter().cloned())
                .collect(),
            dependency_sources: snapshot
                .dependency_sources
                .iter()
                .filter(|item| &item.target == id)
                .flat_map(|item| item.sources.iter().cloned())
                .collect(),
            javac_options: snapshot
                .javac_options
                .iter()
                .find(|item| &item.target == id)
                .cloned(),
            python_options: snapshot
                .python_options
                .iter()
                .find(|item| &item.target == id)
                .cloned(),
            libraries: snapshot
                .libraries
                .iter()
                .filter(|lib| target.dependencies.contains(&lib.id))
                .cloned()
                .collect(),
        })
    }

    /// Captures the load state for persistence
    pub fn to_state(&self) -> ModelState {
        ModelState {
            snapshot: self.fingerprint.clone(),
            loaded: self.state.loaded_set().map(|loaded| {
                self.snapshot
                    .target_ids()
                    .filter(|id| loaded.contains(*id))
                    .cloned()
                    .collect()
            }),
        }
    }

    /// Replaces the load state with a saved one
    ///
    /// The state must come from the same snapshot and must not load
    /// overlapping targets; otherwise the current state is left untouched.
    pub fn restore(&mut self, state: ModelState) -> Result<(), ModelError> {
        if state.snapshot != self.fingerprint {
            return Err(ModelError::StaleState {
                expected: self.fingerprint.clone(),
                found: state.snapshot,
            });
        }

        let Some(ids) = state.loaded else {
            self.state = LoadStateStore::new();
            return Ok(());
        };

        let loaded: BTreeSet<TargetId> = ids.into_iter().collect();
        for id in &loaded {
            self.ensure_known(id)?;
            if let Some(other) = self
                .overlap_graph()
                .conflicts(id)
                .into_iter()
                .find(|c| loaded.contains(*c))
            {
                return Err(ModelError::ConflictingState(id.clone(), other.clone()));
            }
        }

        self.state = LoadStateStore::from_loaded(Some(loaded));
        Ok(())
    }

    fn ensure_known(&self, id: &TargetId) -> Result<(), ModelError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(ModelError::UnknownTarget(id.clone()))
        }
    }

    fn load_evicting(&mut self, id: &TargetId) {
        let conflicts: Vec<TargetId> = self
            .overlap_graph()
            .conflicts(id)
            .into_iter()
            .cloned()
            .collect();
        let evicted = self.state.load_evicting(id, &conflicts);
        if !evicted.is_empty() {
            tracing::trace!(target_id = %id, ?evicted, "evicted overlapping targets");
        }
    }

    /// Breadth-first walk over dependencies, keeping the first of any
    /// overlapping pair
    fn dependency_closure(&self, root: &TargetId) -> Vec<TargetId> {
        let graph = self.overlap_graph();
        let mut accepted: Vec<TargetId> = Vec::new();
        let mut accepted_set: HashSet<&TargetId> = HashSet::new();
        let mut visited: HashSet<&TargetId> = HashSet::from([root]);
        let mut queue: VecDeque<&TargetId> = VecDeque::from([root]);

        while let Some(id) = queue.pop_front() {
            let Some(target) = self.target(id) else {
                tracing::trace!(target_id = %id, "skipping dependency missing from snapshot");
                continue;
            };
            if graph
                .conflicts(id)
                .into_iter()
                .any(|c| accepted_set.contains(c))
            {
                tracing::trace!(target_id = %id, "skipping dependency overlapping an accepted target");
                continue;
            }

            accepted.push(id.clone());
            accepted_set.insert(id);
            for dep in &target.dependencies {
                if visited.insert(dep) {
                    queue.push_back(dep);
                }
            }
        }

        accepted
    }

    /// Describes the change from `before` to the current loaded set, in
    /// snapshot order
    fn diff_from(&self, before: &BTreeSet<TargetId>) -> ChangeDiff {
        let mut diff = ChangeDiff::default();
        for target in &self.snapshot.targets {
            let was = before.contains(&target.id);
            let is = self.state.is_loaded(&target.id);
            if is && !was {
                if let Some(details) = self.module_details(&target.id) {
                    diff.modules_to_add.push(details);
                }
            } else if was && !is {
                diff.modules_to_remove.push(self.removed_module(&target.id));
            }
        }
        diff
    }

    fn removed_module(&self, id: &TargetId) -> RemovedModule {
        RemovedModule {
            target: id.clone(),
            module_name: self.settings.module_naming.module_name(id),
        }
    }
}

/// A [`TargetModel`] shared between callers
///
/// Every operation takes the same lock, so mutations and queries are
/// serialized. The model state is updated before a diff is handed out.
#[derive(Debug, Clone)]
pub struct SharedTargetModel {
    inner: Arc<Mutex<TargetModel>>,
}

impl SharedTargetModel {
    pub fn new(model: TargetModel) -> Self {
        Self {
            inner: Arc::new(Mutex::new(model)),
        }
    }

    /// Locks the model for a sequence of operations
    pub fn lock(&self) -> MutexGuard<'_, TargetModel> {
        self.inner.lock()
    }

    pub fn load_default_targets(&self) -> ChangeDiff {
        self.inner.lock().load_default_targets()
    }

    pub fn load_target(&self, id: &TargetId) -> Result<Option<ChangeDiff>, ModelError> {
        self.inner.lock().load_target(id)
    }

    pub fn load_target_with_dependencies(
        &self,
        id: &TargetId,
    ) -> Result<Option<ChangeDiff>, ModelError> {
        self.inner.lock().load_target_with_dependencies(id)
    }

    pub fn unload_target(&self, id: &TargetId) -> Result<Option<ChangeDiff>, ModelError> {
        self.inner.lock().unload_target(id)
    }

    pub fn clear(&self) -> ChangeDiff {
        self.inner.lock().clear()
    }

    pub fn targets_details_for_document(&self, document: &DocumentId) -> DocumentTargetsDetails {
        self.inner.lock().targets_details_for_document(document)
    }

    /// Returns the ids of loaded targets in snapshot order
    pub fn loaded_target_ids(&self) -> Vec<TargetId> {
        self.inner
            .lock()
            .all_loaded_targets()
            .into_iter()
            .map(|t| t.id.clone())
            .collect()
    }

    pub fn to_state(&self) -> ModelState {
        self.inner.lock().to_state()
    }
}
