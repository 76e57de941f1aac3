//! Query commands (targets, graph, documents, owners, show, status)
//!
//! Read-only: the model is rebuilt from the stored snapshot and state, and
//! nothing is written back beyond discarding saved state that no longer
//! applies.

use anyhow::{Context, Result};

use super::output::Output;
use crate::domain::{BuildTarget, DocumentId, TargetId};
use crate::storage::Project;

/// Which targets `targets` lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFilter {
    All,
    Loaded,
    NotLoaded,
}

/// List targets with their load state
pub fn targets(output: &Output, filter: TargetFilter) -> Result<()> {
    let project = Project::open_current()?;
    let model = project.open_model()?;

    let rows: Vec<(&BuildTarget, bool)> = model
        .snapshot()
        .targets
        .iter()
        .map(|t| (t, model.is_loaded(&t.id)))
        .filter(|(_, loaded)| match filter {
            TargetFilter::All => true,
            TargetFilter::Loaded => *loaded,
            TargetFilter::NotLoaded => !*loaded,
        })
        .collect();

    tracing::debug!(count = rows.len(), ?filter, "listing targets");

    if output.is_json() {
        let items: Vec<_> = rows
            .iter()
            .map(|(t, loaded)| {
                serde_json::json!({
                    "id": t.id,
                    "name": t.name(),
                    "loaded": loaded,
                    "conflicts": model.overlap_graph().conflicts(&t.id),
                })
            })
            .collect();
        output.data(&items);
    } else if rows.is_empty() {
        println!("No targets.");
    } else {
        println!("{:<12} ID", "STATE");
        println!("{}", "-".repeat(60));
        for (target, loaded) in rows {
            let state = if loaded { "loaded" } else { "not-loaded" };
            println!("{:<12} {}", state, target.id);
        }
    }

    Ok(())
}

/// Show the overlap graph
pub fn graph(output: &Output, components: bool) -> Result<()> {
    let project = Project::open_current()?;
    let model = project.open_model()?;
    let graph = model.overlap_graph();

    if components {
        let groups = graph.components();
        if output.is_json() {
            output.data(&groups);
        } else {
            for (i, group) in groups.iter().enumerate() {
                let ids: Vec<&str> = group.iter().map(|id| id.as_str()).collect();
                println!("{}: {}", i + 1, ids.join(", "));
            }
        }
        return Ok(());
    }

    if output.is_json() {
        output.data(&graph.to_map());
    } else if graph.is_empty() {
        println!("No targets with sources.");
    } else {
        for id in graph.target_ids() {
            let conflicts: Vec<&str> = graph.conflicts(id).into_iter().map(|c| c.as_str()).collect();
            if conflicts.is_empty() {
                println!("{}", id);
            } else {
                println!("{} -> {}", id, conflicts.join(", "));
            }
        }
        println!();
        println!("{} targets, {} overlaps", graph.len(), graph.edge_count());
    }

    Ok(())
}

/// List declared documents
pub fn documents(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let model = project.open_model()?;

    if output.is_json() {
        let docs: Vec<_> = model.all_documents().collect();
        output.data(&docs);
    } else {
        for doc in model.all_documents() {
            println!("{}", doc);
        }
    }

    Ok(())
}

/// Show which targets own a document
pub fn owners(output: &Output, document: &str) -> Result<()> {
    let document: DocumentId = document.parse().context("Invalid document")?;
    let project = Project::open_current()?;
    let model = project.open_model()?;

    let details = model.targets_details_for_document(&document);

    if output.is_json() {
        output.data(&details);
    } else if details.loaded_target.is_none() && details.not_loaded_targets.is_empty() {
        println!("No targets own {}", document);
    } else {
        match &details.loaded_target {
            Some(id) => println!("loaded:     {}", id),
            None => println!("loaded:     (none)"),
        }
        for id in &details.not_loaded_targets {
            println!("not loaded: {}", id);
        }
    }

    Ok(())
}

/// Show what a target would materialize as
pub fn show(output: &Output, id: &str) -> Result<()> {
    let id: TargetId = id.parse().context("Invalid target")?;
    let project = Project::open_current()?;
    let model = project.open_model()?;

    let details = model
        .module_details(&id)
        .ok_or_else(|| anyhow::anyhow!("Unknown target: {}", id))?;

    if output.is_json() {
        output.data(&details);
        return Ok(());
    }

    let target = &details.target;
    println!("Target:  {}", target.id);
    println!("Module:  {}", details.module_name);
    println!("Loaded:  {}", if model.is_loaded(&id) { "yes" } else { "no" });
    if !target.language_ids.is_empty() {
        println!("Languages: {}", target.language_ids.join(", "));
    }

    if !details.sources.is_empty() {
        println!();
        println!("Sources:");
        for source in &details.sources {
            let kind = if source.is_directory() { "dir " } else { "file" };
            println!("  [{}] {}", kind, source.uri);
        }
    }

    if !target.dependencies.is_empty() {
        println!();
        println!("Dependencies:");
        for dep in &target.dependencies {
            let marker = if model.contains(dep) { "" } else { " (external)" };
            println!("  {}{}", dep, marker);
        }
    }

    let conflicts = model.overlap_graph().conflicts(&id);
    if !conflicts.is_empty() {
        println!();
        println!("Overlaps with:");
        for other in conflicts {
            println!("  {}", other);
        }
    }

    Ok(())
}

/// Show project status overview
pub fn status(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let model = project.open_model()?;
    let graph = model.overlap_graph();

    let total = model.snapshot().targets.len();
    let loaded = model.all_loaded_targets().len();
    let modules = project.module_store()?.len();
    let settings = model.settings();

    if output.is_json() {
        output.data(&serde_json::json!({
            "targets": {
                "total": total,
                "loaded": loaded,
                "not_loaded": total - loaded,
            },
            "initialized": model.is_initialized(),
            "overlaps": graph.edge_count(),
            "documents": model.all_documents().count(),
            "modules": modules,
            "settings": settings,
            "snapshot": model.fingerprint(),
        }));
    } else {
        println!("Project Status");
        println!("{}", "=".repeat(40));
        println!();
        println!("Targets: {} total", total);
        if model.is_initialized() {
            println!("  Loaded:      {}", loaded);
            println!("  Not loaded:  {}", total - loaded);
        } else {
            println!("  Nothing loaded yet (run 'targetmap defaults')");
        }
        println!();
        println!("Overlaps:  {}", graph.edge_count());
        println!("Documents: {}", model.all_documents().count());
        println!("Modules:   {}", modules);
        println!();
        println!("Selection: {}", settings.selection.as_str());
        println!(
            "Grouping:  {}",
            if settings.directory_grouping.is_enabled() { "on" } else { "off" }
        );
    }

    Ok(())
}
