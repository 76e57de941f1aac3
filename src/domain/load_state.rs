//! Loaded/not-loaded bookkeeping
//!
//! The store knows nothing about overlaps; callers pass the conflicts to
//! evict. It only guarantees the two-state lifecycle: `Uninitialized` until
//! the first load, `Active` afterwards.

use std::collections::BTreeSet;

use super::id::TargetId;

/// Current load state of a model
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Nothing has been loaded yet; every target counts as not loaded
    #[default]
    Uninitialized,
    /// An explicit loaded set exists (possibly empty)
    Active(BTreeSet<TargetId>),
}

#[derive(Debug, Clone, Default)]
pub struct LoadStateStore {
    state: LoadState,
}

impl LoadStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a store from a persisted loaded set
    pub fn from_loaded(loaded: Option<BTreeSet<TargetId>>) -> Self {
        Self {
            state: loaded.map_or(LoadState::Uninitialized, LoadState::Active),
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, LoadState::Active(_))
    }

    pub fn is_loaded(&self, target: &TargetId) -> bool {
        match &self.state {
            LoadState::Uninitialized => false,
            LoadState::Active(loaded) => loaded.contains(target),
        }
    }

    /// Returns a copy of the loaded set (empty when uninitialized)
    pub fn loaded(&self) -> BTreeSet<TargetId> {
        match &self.state {
            LoadState::Uninitialized => BTreeSet::new(),
            LoadState::Active(loaded) => loaded.clone(),
        }
    }

    /// Returns the loaded set, or None when uninitialized
    pub fn loaded_set(&self) -> Option<&BTreeSet<TargetId>> {
        match &self.state {
            LoadState::Uninitialized => None,
            LoadState::Active(loaded) => Some(loaded),
        }
    }

    /// Replaces the whole loaded set
    pub fn replace(&mut self, loaded: BTreeSet<TargetId>) {
        self.state = LoadState::Active(loaded);
    }

    /// Loads `target` after unloading every loaded target in `conflicts`
    ///
    /// Returns the evicted targets.
    pub fn load_evicting<'a>(
        &mut self,
        target: &TargetId,
        conflicts: impl IntoIterator<Item = &'a TargetId>,
    ) -> Vec<TargetId> {
        let mut loaded = self.clear();
        let evicted: Vec<TargetId> = conflicts
            .into_iter()
            .filter(|c| loaded.remove(*c))
            .cloned()
            .collect();
        loaded.insert(target.clone());
        self.state = LoadState::Active(loaded);
        evicted
    }

    /// Unloads a single target, returning true if it was loaded
    pub fn unload(&mut self, target: &TargetId) -> bool {
        match &mut self.state {
            LoadState::Uninitialized => false,
            LoadState::Active(loaded) => loaded.remove(target),
        }
    }

    /// Drops the loaded set and returns to `Uninitialized`
    pub fn clear(&mut self) -> BTreeSet<TargetId> {
        match std::mem::take(&mut self.state) {
            LoadState::Uninitialized => BTreeSet::new(),
            LoadState::Active(loaded) => loaded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> TargetId {
        TargetId::new(s)
    }

    #[test]
    fn starts_uninitialized() {
        let store = LoadStateStore::new();
        assert!(!store.is_initialized());
        assert!(store.loaded().is_empty());
        assert!(store.loaded_set().is_none());
        assert!(!store.is_loaded(&id("//a")));
    }

    #[test]
    fn load_from_uninitialized_activates() {
        let mut store = LoadStateStore::new();
        let evicted = store.load_evicting(&id("//a"), [&id("//b")]);

        assert!(evicted.is_empty());
        assert!(store.is_initialized());
        assert!(store.is_loaded(&id("//a")));
    }

    #[test]
    fn load_evicts_only_loaded_conflicts() {
        let mut store = LoadStateStore::new();
        store.replace([id("//b"), id("//c")].into_iter().collect());

        let conflicts = [id("//b"), id("//x")];
        let evicted = store.load_evicting(&id("//a"), conflicts.iter());

        assert_eq!(evicted, vec![id("//b")]);
        assert_eq!(
            store.loaded(),
            [id("//a"), id("//c")].into_iter().collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn unload_and_clear() {
        let mut store = LoadStateStore::new();
        assert!(!store.unload(&id("//a")));

        store.replace([id("//a"), id("//b")].into_iter().collect());
        assert!(store.unload(&id("//a")));
        assert!(!store.unload(&id("//a")));

        let dropped = store.clear();
        assert_eq!(dropped.len(), 1);
        assert_eq!(store.state(), &LoadState::Uninitialized);
    }

    #[test]
    fn empty_active_differs_from_uninitialized() {
        let mut store = LoadStateStore::new();
        store.replace(BTreeSet::new());

        assert!(store.is_initialized());
        assert_eq!(store.loaded_set(), Some(&BTreeSet::new()));
    }

    #[test]
    fn restore_from_persisted_set() {
        assert!(!LoadStateStore::from_loaded(None).is_initialized());

        let store = LoadStateStore::from_loaded(Some([id("//a")].into_iter().collect()));
        assert!(store.is_loaded(&id("//a")));
    }
}
