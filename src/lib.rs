//! targetmap - Overlap resolution for build targets
//!
//! Build tools may report targets whose source sets overlap, while an IDE
//! project model needs every file to belong to exactly one module. targetmap
//! indexes declared sources, builds the overlap graph between targets, picks
//! a non-overlapping default selection and keeps a load state that evicts
//! conflicts on every change, emitting [`ChangeDiff`]s for the host.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{
    BuildTarget, ChangeDiff, DocumentId, ModelError, ModelSettings, ProjectModelUpdater,
    ProjectSnapshot, SharedTargetModel, TargetId, TargetModel,
};
