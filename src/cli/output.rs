//! Output formatting for CLI commands

use serde::Serialize;

use crate::domain::ChangeDiff;
use crate::storage;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl From<storage::OutputFormat> for OutputFormat {
    fn from(format: storage::OutputFormat) -> Self {
        match format {
            storage::OutputFormat::Text => OutputFormat::Text,
            storage::OutputFormat::Json => OutputFormat::Json,
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Prints a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "success": true,
                        "message": message
                    })
                );
            }
        }
    }

    /// Prints structured data
    pub fn data<T: Serialize>(&self, data: &T) {
        match self.format {
            OutputFormat::Text => {
                // Callers normally print text themselves; pretty JSON is the fallback
                if let Ok(json) = serde_json::to_string_pretty(data) {
                    println!("{}", json);
                }
            }
            OutputFormat::Json => {
                if let Ok(json) = serde_json::to_string(data) {
                    println!("{}", json);
                }
            }
        }
    }

    /// Prints a diff summary: one `+`/`-` line per module, or its JSON form
    pub fn diff(&self, diff: Option<&ChangeDiff>) {
        let added: Vec<&str> = diff
            .into_iter()
            .flat_map(|d| d.added())
            .map(|id| id.as_str())
            .collect();
        let removed: Vec<&str> = diff
            .into_iter()
            .flat_map(|d| d.removed())
            .map(|id| id.as_str())
            .collect();

        if self.is_json() {
            self.data(&serde_json::json!({
                "changed": !added.is_empty() || !removed.is_empty(),
                "added": added,
                "removed": removed,
            }));
            return;
        }

        if added.is_empty() && removed.is_empty() {
            println!("No changes");
            return;
        }
        for id in removed {
            println!("- {}", id);
        }
        for id in added {
            println!("+ {}", id);
        }
    }

    /// Returns true if using JSON format
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}
