//! Resolve request types
//!
//! A [`RawQuery`] is built once per resolve request by the telephony layer and
//! never mutated afterwards. [`PreparedNumber`] is the dispatcher's view of the
//! same number once forwarding suffixes, SIP schemes and separators have been
//! dealt with.

use crate::error::ValidationError;
use crate::number;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a call, stable for the call's lifetime
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Create a new cache key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// How the network allows the number to be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presentation {
    #[default]
    Allowed,
    Restricted,
    Unknown,
    Payphone,
}

/// A resolve request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQuery {
    pub key: CacheKey,
    pub phone_number: String,
    pub is_incoming: bool,
    pub country_iso: String,
    pub cnap_name: String,
    #[serde(default)]
    pub presentation: Presentation,
}

impl RawQuery {
    /// Create a request for `phone_number` under `key` with empty metadata
    pub fn new(key: impl Into<CacheKey>, phone_number: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            phone_number: phone_number.into(),
            is_incoming: false,
            country_iso: String::new(),
            cnap_name: String::new(),
            presentation: Presentation::Allowed,
        }
    }

    /// Mark the call as incoming
    pub fn incoming(mut self, is_incoming: bool) -> Self {
        self.is_incoming = is_incoming;
        self
    }

    /// Set the ISO country code used for geocoding and lookups
    pub fn with_country_iso(mut self, country_iso: impl Into<String>) -> Self {
        self.country_iso = country_iso.into();
        self
    }

    /// Set the CNAP name supplied by the network
    pub fn with_cnap_name(mut self, cnap_name: impl Into<String>) -> Self {
        self.cnap_name = cnap_name.into();
        self
    }

    /// Set the number presentation reported by the network
    pub fn with_presentation(mut self, presentation: Presentation) -> Self {
        self.presentation = presentation;
        self
    }

    /// The presentation after special CNAP strings have been accounted for
    pub fn effective_presentation(&self) -> Presentation {
        if self.presentation != Presentation::Allowed {
            return self.presentation;
        }
        let (primary, _) = number::split_forwarding(&self.phone_number);
        number::special_cnap_presentation(primary.trim()).unwrap_or(Presentation::Allowed)
    }

    /// The CNAP name, if the network supplied a non-empty one
    pub fn cnap(&self) -> Option<&str> {
        let name = self.cnap_name.trim();
        (!name.is_empty()).then_some(name)
    }
}

/// A raw number split into the parts the dispatcher works with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedNumber {
    /// Number shown to the user (forwarding suffix and `sip:` removed)
    pub display: String,
    /// Number handed to providers
    pub lookup: String,
    /// Forwarding number found after `&`, never looked up
    pub forwarding: Option<String>,
    /// Whether the number is a URI-style (SIP) address
    pub is_sip: bool,
}

impl PreparedNumber {
    /// Prepare `raw` for lookup
    ///
    /// SIP addresses are kept verbatim. Other numbers lose their forwarding
    /// suffix and their separators. A number with nothing left to look up is
    /// malformed.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ValidationError::malformed_number("number is empty"));
        }

        if number::is_uri_number(raw) {
            return Ok(Self {
                display: number::strip_sip_prefix(raw).to_string(),
                lookup: raw.to_string(),
                forwarding: None,
                is_sip: true,
            });
        }

        let (primary, forwarding) = number::split_forwarding(raw);
        let lookup = number::strip_separators(primary);
        if lookup.is_empty() {
            return Err(ValidationError::malformed_number(
                "number has no dialable digits",
            ));
        }

        Ok(Self {
            display: primary.trim().to_string(),
            lookup,
            forwarding: forwarding.map(|s| s.trim().to_string()),
            is_sip: false,
        })
    }

    /// For a SIP address whose user part is a plain phone number, that number
    pub fn numeric_username(&self) -> Option<&str> {
        if !self.is_sip {
            return None;
        }
        let username = number::username_from_uri(&self.lookup);
        number::is_global_phone_number(username).then_some(username)
    }
}
