use super::OutputFormatter;
use anyhow::Result;
use callerid_core::{CacheKey, ContactEvent, LookupSource, ResolvedEntry};
use colored::*;
use serde_json::json;

/// Text formatter for human-readable output
pub struct TextFormatter {
    use_color: bool,
}

impl TextFormatter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    fn colorize(&self, text: &str, color: fn(&str) -> ColoredString) -> String {
        if self.use_color {
            color(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn source(source: &LookupSource) -> String {
        match source {
            LookupSource::NotFound => "not found".to_string(),
            LookupSource::Local => "local".to_string(),
            LookupSource::Directory { id } => format!("directory {id}"),
            LookupSource::Network => "network".to_string(),
            LookupSource::Emergency => "emergency".to_string(),
            LookupSource::Voicemail => "voicemail".to_string(),
            LookupSource::Presentation => "presentation".to_string(),
        }
    }

    fn describe(&self, entry: &ResolvedEntry) -> String {
        let mut line = self.colorize(entry.best_label().unwrap_or("-"), |s| s.bold());
        if entry.has_name()
            && let Some(number) = &entry.display_number
        {
            line.push_str(&format!(" <{number}>"));
        }
        if let Some(label) = &entry.label {
            line.push_str(&format!(" ({label})"));
        }
        if let Some(location) = &entry.location {
            line.push_str(&format!(" {}", self.colorize(location, |s| s.cyan())));
        }
        if let Some(forwarding) = &entry.forwarding_number {
            line.push_str(&format!(" via {forwarding}"));
        }
        if entry.is_business {
            line.push_str(" [business]");
        }
        line.push_str(&format!(
            " [{}]",
            self.colorize(&Self::source(&entry.lookup_source), |s| s.yellow())
        ));
        line
    }
}

impl OutputFormatter for TextFormatter {
    fn format_event(&self, event: &ContactEvent) -> Result<String> {
        Ok(match event {
            ContactEvent::Info { key, entry } => {
                let pending = if entry.has_pending_enrichment {
                    " ..."
                } else {
                    ""
                };
                format!("{key}: {}{pending}", self.describe(entry))
            }
            ContactEvent::ImageLoaded { key, entry } => {
                let size = entry.photo.as_ref().map_or(0, |p| p.len());
                format!(
                    "{key}: {} ({size} bytes)",
                    self.colorize("photo loaded", |s| s.green())
                )
            }
        })
    }

    fn format_final(&self, key: &CacheKey, entry: Option<&ResolvedEntry>) -> Result<String> {
        Ok(match entry {
            Some(entry) => format!(
                "{} {key}: {}",
                self.colorize("=>", |s| s.green()),
                self.describe(entry)
            ),
            None => format!("{} {key}: no entry", self.colorize("=>", |s| s.red())),
        })
    }
}

/// JSON Lines formatter: one object per delivery
pub struct JsonLinesFormatter;

impl OutputFormatter for JsonLinesFormatter {
    fn format_event(&self, event: &ContactEvent) -> Result<String> {
        let (kind, key, entry) = match event {
            ContactEvent::Info { key, entry } => ("contact_info", key, entry),
            ContactEvent::ImageLoaded { key, entry } => ("image_loaded", key, entry),
        };
        let value = json!({
            "event": kind,
            "key": key,
            "entry": entry,
            "photo_bytes": entry.photo.as_ref().map(|p| p.len()),
        });
        Ok(serde_json::to_string(&value)?)
    }

    fn format_final(&self, key: &CacheKey, entry: Option<&ResolvedEntry>) -> Result<String> {
        Ok(serde_json::to_string(&json!({
            "event": "final",
            "key": key,
            "entry": entry,
        }))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> ResolvedEntry {
        ResolvedEntry {
            display_name: Some("Alice".to_string()),
            display_number: Some("415-555-1212".to_string()),
            label: Some("Mobile".to_string()),
            lookup_source: LookupSource::Local,
            has_pending_enrichment: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_text_event_without_color() {
        let event = ContactEvent::Info {
            key: CacheKey::from("call-1"),
            entry: alice(),
        };
        let line = TextFormatter::new(false).format_event(&event).unwrap();
        assert_eq!(line, "call-1: Alice <415-555-1212> (Mobile) [local] ...");
    }

    #[test]
    fn test_text_final_missing_entry() {
        let line = TextFormatter::new(false)
            .format_final(&CacheKey::from("call-2"), None)
            .unwrap();
        assert_eq!(line, "=> call-2: no entry");
    }

    #[test]
    fn test_json_event_is_single_line() {
        let event = ContactEvent::ImageLoaded {
            key: CacheKey::from("call-1"),
            entry: alice(),
        };
        let line = JsonLinesFormatter.format_event(&event).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert!(!line.contains('\n'));
        assert_eq!(value["event"], "image_loaded");
        assert_eq!(value["key"], "call-1");
        assert_eq!(value["entry"]["display_name"], "Alice");
    }
}
