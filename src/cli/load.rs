//! Load-state commands (import, defaults, load, unload, clear)
//!
//! Each command mutates the model, saves the new state and applies the diff
//! to the module store before printing it.

use std::path::Path;

use anyhow::{Context, Result};

use super::output::Output;
use crate::domain::{ChangeDiff, TargetId, TargetModel};
use crate::storage::Project;

/// Import a snapshot file into the current project
pub fn import(output: &Output, file: &Path) -> Result<()> {
    let project = Project::open_current()?;
    let snapshot = project.import_snapshot(file)?;

    let sources: usize = snapshot.sources.iter().map(|s| s.sources.len()).sum();
    if output.is_json() {
        output.data(&serde_json::json!({
            "targets": snapshot.targets.len(),
            "sources": sources,
        }));
    } else {
        output.success(&format!(
            "Imported {} targets ({} source items) from {}",
            snapshot.targets.len(),
            sources,
            file.display()
        ));
    }
    Ok(())
}

/// Replace the loaded set with the default selection
pub fn defaults(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let mut model = project.open_model()?;

    let diff = model.load_default_targets();
    finish(&project, &model, output, Some(diff))
}

/// Load a target, optionally with its dependencies
pub fn load(output: &Output, id: &str, with_deps: bool) -> Result<()> {
    let id = parse_target(id)?;
    let project = Project::open_current()?;
    let mut model = project.open_model()?;

    let diff = if with_deps {
        model.load_target_with_dependencies(&id)?
    } else {
        model.load_target(&id)?
    };

    if diff.is_none() && !output.is_json() {
        println!("{} is already loaded", id);
        return Ok(());
    }
    finish(&project, &model, output, diff)
}

/// Unload a target
pub fn unload(output: &Output, id: &str) -> Result<()> {
    let id = parse_target(id)?;
    let project = Project::open_current()?;
    let mut model = project.open_model()?;

    let diff = model.unload_target(&id)?;
    if diff.is_none() && !output.is_json() {
        println!("{} is not loaded", id);
        return Ok(());
    }
    finish(&project, &model, output, diff)
}

/// Unload everything
pub fn clear(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let mut model = project.open_model()?;

    let diff = model.clear();
    finish(&project, &model, output, Some(diff))
}

fn parse_target(id: &str) -> Result<TargetId> {
    id.parse().context("Invalid target")
}

fn finish(
    project: &Project,
    model: &TargetModel,
    output: &Output,
    diff: Option<ChangeDiff>,
) -> Result<()> {
    project.commit(model, diff.clone())?;
    output.diff(diff.as_ref());
    Ok(())
}
