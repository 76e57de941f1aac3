//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::query::TargetFilter;
use super::{load, query};
use crate::storage::{Config, Project};

#[derive(Parser)]
#[command(name = "targetmap")]
#[command(author, version, about = "Resolve overlapping build targets into a loadable project model")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new targetmap project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Import a snapshot of targets and sources (JSON)
    Import {
        /// Snapshot file
        file: PathBuf,
    },

    /// List targets and their load state
    Targets {
        /// Only loaded targets
        #[arg(long, conflicts_with = "not_loaded")]
        loaded: bool,

        /// Only targets that are not loaded
        #[arg(long)]
        not_loaded: bool,
    },

    /// Show the overlap graph
    Graph {
        /// Group targets into connected components
        #[arg(long)]
        components: bool,
    },

    /// List declared source documents
    Documents,

    /// Show which targets own a document
    Owners {
        /// Document URI (e.g., file:///repo/src/Main.java)
        document: String,
    },

    /// Show module details for a target
    Show {
        /// Target ID
        id: String,
    },

    /// Load the default non-overlapping selection
    Defaults,

    /// Load a target, unloading targets it overlaps with
    Load {
        /// Target ID
        id: String,

        /// Also load its transitive dependencies
        #[arg(long)]
        with_deps: bool,
    },

    /// Unload a target
    Unload {
        /// Target ID
        id: String,
    },

    /// Unload everything
    Clear,

    /// Show project status overview
    Status,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    init_tracing(&config, cli.verbose);

    let format = cli
        .format
        .unwrap_or_else(|| config.global.default_format.into());
    let output = Output::new(format);

    tracing::debug!(root = ?config.project_root, "targetmap starting");

    match cli.command {
        Commands::Init { path } => {
            let project = Project::init(&path)?;
            tracing::debug!(dir = %project.data_dir().display(), "created data directory");
            output.success(&format!(
                "Initialized targetmap project at {}",
                project.root().display()
            ));
        }

        Commands::Import { file } => load::import(&output, &file)?,

        Commands::Targets { loaded, not_loaded } => {
            let filter = match (loaded, not_loaded) {
                (true, _) => TargetFilter::Loaded,
                (_, true) => TargetFilter::NotLoaded,
                _ => TargetFilter::All,
            };
            query::targets(&output, filter)?
        }
        Commands::Graph { components } => query::graph(&output, components)?,
        Commands::Documents => query::documents(&output)?,
        Commands::Owners { document } => query::owners(&output, &document)?,
        Commands::Show { id } => query::show(&output, &id)?,
        Commands::Status => query::status(&output)?,

        Commands::Defaults => load::defaults(&output)?,
        Commands::Load { id, with_deps } => load::load(&output, &id, with_deps)?,
        Commands::Unload { id } => load::unload(&output, &id)?,
        Commands::Clear => load::clear(&output)?,
    }

    tracing::debug!("command completed");
    Ok(())
}

/// Installs the stderr subscriber
fn init_tracing(config: &Config, verbose: bool) {
    let filter = config.project.logging.env_filter(verbose);

    // A subscriber may already be installed when running under a test harness
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
