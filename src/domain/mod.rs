//! Domain models for targetmap
//!
//! The overlap resolution and load-state engine, without any I/O concerns.

mod id;
mod target;
mod snapshot;
mod source_index;
mod overlap;
mod selection;
mod load_state;
mod diff;
mod model;

pub use id::{DocumentId, IdError, TargetId};
pub use target::{
    BuildTarget, BuildTargetCapabilities, DependencySourcesItem, JavacOptionsItem, LibraryItem,
    PythonOptionsItem, ResourcesItem, SourceItem, SourceItemKind, SourcesItem,
};
pub use snapshot::{ProjectSnapshot, SnapshotError};
pub use source_index::{DirectoryGrouping, SourceIndex};
pub use overlap::OverlapGraph;
pub use selection::{default_selection, SelectionPolicy};
pub use load_state::{LoadState, LoadStateStore};
pub use diff::{ChangeDiff, ModuleDetails, ModuleNaming, ProjectModelUpdater, RemovedModule};
pub use model::{
    DocumentTargetsDetails, ModelError, ModelSettings, ModelState, SharedTargetModel, TargetModel,
};
