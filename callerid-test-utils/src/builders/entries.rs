//! Builders for provider matches and cache entries

use callerid_core::{ContactMatch, LookupSource, ResolvedEntry};

/// Builder for a provider's [`ContactMatch`]
pub struct TestMatchBuilder {
    found: ContactMatch,
}

impl TestMatchBuilder {
    /// Start a match for a contact named `name`, labelled "Mobile"
    pub fn new(name: &str) -> Self {
        Self {
            found: ContactMatch::named(name).with_label("Mobile"),
        }
    }

    /// Start a match for a business
    pub fn business(name: &str) -> Self {
        Self {
            found: ContactMatch::named(name).business(true),
        }
    }

    pub fn number(mut self, number: &str) -> Self {
        self.found.number = Some(number.to_string());
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.found.label = Some(label.to_string());
        self
    }

    pub fn location(mut self, location: &str) -> Self {
        self.found.location = Some(location.to_string());
        self
    }

    pub fn lookup_key(mut self, lookup_key: &str) -> Self {
        self.found.lookup_key = Some(lookup_key.to_string());
        self
    }

    pub fn photo(mut self, uri: &str) -> Self {
        self.found.photo_uri = Some(uri.to_string());
        self
    }

    pub fn build(self) -> ContactMatch {
        self.found
    }
}

/// Builder for a [`ResolvedEntry`] as the dispatcher would produce it
pub struct TestEntryBuilder {
    entry: ResolvedEntry,
}

impl TestEntryBuilder {
    /// Start an entry resolved from `number`
    pub fn new(number: &str) -> Self {
        Self {
            entry: ResolvedEntry {
                display_number: Some(number.to_string()),
                original_number: Some(number.to_string()),
                ..Default::default()
            },
        }
    }

    /// Mark the entry as a local contact named `name`
    pub fn local(mut self, name: &str) -> Self {
        self.entry.display_name = Some(name.to_string());
        self.entry.is_local_match = true;
        self.entry.lookup_source = LookupSource::Local;
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.entry.display_name = Some(name.to_string());
        self
    }

    pub fn location(mut self, location: &str) -> Self {
        self.entry.location = Some(location.to_string());
        self
    }

    pub fn photo_uri(mut self, uri: &str) -> Self {
        self.entry.photo_uri = Some(uri.to_string());
        self
    }

    pub fn source(mut self, source: LookupSource) -> Self {
        self.entry.lookup_source = source;
        self
    }

    pub fn build(self) -> ResolvedEntry {
        self.entry
    }
}
