mod formatters;

pub use formatters::{JsonLinesFormatter, TextFormatter};

use anyhow::Result;
use callerid_core::{CacheKey, ContactEvent, ResolvedEntry};

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// Parse output format from string
    pub fn from_string(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" | "jsonl" => Ok(Self::Json),
            _ => anyhow::bail!("Unknown output format: {}", s),
        }
    }

    /// Build the formatter for this format
    pub fn formatter(self, use_color: bool) -> Box<dyn OutputFormatter> {
        match self {
            Self::Text => Box::new(TextFormatter::new(use_color)),
            Self::Json => Box::new(JsonLinesFormatter),
        }
    }
}

/// Trait for output formatters
pub trait OutputFormatter: Send + Sync {
    /// Format one callback delivery
    fn format_event(&self, event: &ContactEvent) -> Result<String>;

    /// Format the entry a key settled on once nothing is in flight
    fn format_final(&self, key: &CacheKey, entry: Option<&ResolvedEntry>) -> Result<String>;
}
