//! Data types returned by identity providers

use serde::{Deserialize, Serialize};

/// Handle of one secondary (enterprise/remote) directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirectoryHandle {
    pub id: u64,
    pub name: String,
}

impl DirectoryHandle {
    /// Create a new directory handle
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A provider's answer for a number: the identity it found
///
/// Providers return `Ok(None)` when the number is unknown to them; a
/// `ContactMatch` always means "contact exists".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMatch {
    pub name: Option<String>,
    pub number: Option<String>,
    pub label: Option<String>,
    pub location: Option<String>,
    pub lookup_key: Option<String>,
    pub photo_uri: Option<String>,
    #[serde(default)]
    pub is_business: bool,
}

impl ContactMatch {
    /// Create a match carrying a display name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_lookup_key(mut self, lookup_key: impl Into<String>) -> Self {
        self.lookup_key = Some(lookup_key.into());
        self
    }

    pub fn with_photo_uri(mut self, photo_uri: impl Into<String>) -> Self {
        self.photo_uri = Some(photo_uri.into());
        self
    }

    pub fn business(mut self, is_business: bool) -> Self {
        self.is_business = is_business;
        self
    }
}
