//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project management | `init`, `import`, `status` |
//! | Query | Inspect targets and overlaps | `targets`, `graph`, `owners`, `show` |
//! | Load | Change what is loaded | `defaults`, `load`, `unload`, `clear` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Logging
//!
//! Diagnostics go to stderr through `tracing`. The level comes from
//! `[logging] level` in `.targetmap/config.toml`, `RUST_LOG` is appended, and
//! `--verbose` (or `-v`) forces debug output:
//! ```bash
//! targetmap --verbose load //app:lib --with-deps
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod query;
mod load;

pub use app::{Cli, Commands, run};
pub use output::{Output, OutputFormat};
