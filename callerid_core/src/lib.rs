//! Caller Identity Core Library
//!
//! An asynchronous contact-resolution cache: given a call key and a raw phone
//! number it produces a best-effort display identity by querying the local
//! directory, secondary directories, a network lookup service and a photo
//! source, without blocking the caller and without letting late results from
//! a superseded lookup overwrite newer data.

pub mod cache;
pub mod dispatch;
pub mod error;
pub mod identity;
pub mod number;
pub mod photo;
pub mod query;

// Re-export main types
pub use cache::{
    CacheStats, ChannelCallback, ContactCache, ContactEvent, ContactInfoCallback, FnCallback,
    LookupSource, PhotoKind, QueryToken, ResolvedEntry, StageOutcome,
};
pub use dispatch::{Dispatcher, QueryDispatcher, StageEmitter, StageUpdate};
pub use error::{Error, Result};
pub use identity::{
    ContactMatch, DirectoryHandle, DirectoryIdentityProvider, DirectoryList, GeocodeService,
    LocalIdentityProvider, NetworkNumberLookupService, PhotoFetcher,
};
pub use photo::{FsPhotoFetcher, PhotoLoader};
pub use query::{CacheKey, Presentation, RawQuery};

use error::ValidationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Display strings for entries that are not backed by a contact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub emergency: String,
    pub voicemail: String,
    pub unknown: String,
    pub private: String,
    pub payphone: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            emergency: "Emergency number".to_string(),
            voicemail: "Voicemail".to_string(),
            unknown: "Unknown".to_string(),
            private: "Private number".to_string(),
            payphone: "Payphone".to_string(),
        }
    }
}

/// Cache and dispatcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Describe unnamed numbers by region ("San Francisco, CA")
    pub geocode_unknown_numbers: bool,
    pub emergency_numbers: Vec<String>,
    pub voicemail_numbers: Vec<String>,
    pub labels: Labels,
    /// Force-complete dispatches still running after this many milliseconds
    pub dispatch_timeout_ms: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            geocode_unknown_numbers: true,
            emergency_numbers: ["112", "911", "999", "000", "08", "110", "118", "119"]
                .into_iter()
                .map(String::from)
                .collect(),
            voicemail_numbers: Vec::new(),
            labels: Labels::default(),
            dispatch_timeout_ms: None,
        }
    }
}

impl CacheConfig {
    /// Create a test configuration
    pub fn test() -> Self {
        Self {
            voicemail_numbers: vec!["*86".to_string()],
            ..Self::default()
        }
    }

    pub fn dispatch_timeout(&self) -> Option<Duration> {
        self.dispatch_timeout_ms.map(Duration::from_millis)
    }

    /// Check the configuration for values the cache cannot work with
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.dispatch_timeout_ms == Some(0) {
            return Err(ValidationError::invalid_configuration(
                "dispatch_timeout_ms must be greater than zero",
            ));
        }
        let mut special = self.emergency_numbers.iter().chain(&self.voicemail_numbers);
        if let Some(bad) = special.find(|n| number::strip_separators(n).is_empty()) {
            return Err(ValidationError::invalid_configuration(&format!(
                "'{bad}' is not a dialable number"
            )));
        }
        Ok(())
    }
}
