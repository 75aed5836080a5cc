//! The cache's value type and its merge rules

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Who produced the field set currently held by an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LookupSource {
    #[default]
    NotFound,
    Local,
    Directory {
        id: u64,
    },
    Network,
    Emergency,
    Voicemail,
    /// Synthesized from a restricted/unknown/payphone presentation
    Presentation,
}

/// What the photo bytes (or lack thereof) stand for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoKind {
    #[default]
    None,
    Contact,
    /// Business without an image of its own
    Business,
}

/// Best-effort display identity for one call
///
/// `photo_uri` is kept once the bytes are in `photo`, so a later dispatch that
/// points at the same picture can reuse them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEntry {
    pub display_name: Option<String>,
    pub display_number: Option<String>,
    pub label: Option<String>,
    pub location: Option<String>,
    #[serde(skip)]
    pub photo: Option<Bytes>,
    pub photo_uri: Option<String>,
    pub photo_kind: PhotoKind,
    pub lookup_key: Option<String>,
    pub forwarding_number: Option<String>,
    /// Raw number of the request that produced this entry
    pub original_number: Option<String>,
    pub is_local_match: bool,
    pub is_emergency_number: bool,
    pub is_voicemail_number: bool,
    pub is_business: bool,
    pub is_sip: bool,
    pub lookup_source: LookupSource,
    pub query_version: u64,
    pub has_pending_enrichment: bool,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl ResolvedEntry {
    /// Whether a display name is known
    pub fn has_name(&self) -> bool {
        self.display_name
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty())
    }

    /// Name if known, otherwise the number, otherwise nothing
    pub fn best_label(&self) -> Option<&str> {
        if self.has_name() {
            self.display_name.as_deref()
        } else {
            self.display_number.as_deref()
        }
    }

    /// Build the entry that replaces `self` wholesale
    ///
    /// Emergency and voicemail calls keep that nature across a number change,
    /// and identical photo URIs keep the bytes already fetched.
    pub fn replaced_by(&self, mut next: ResolvedEntry) -> ResolvedEntry {
        if self.is_emergency_number && !next.is_emergency_number {
            next.is_emergency_number = true;
            next.display_name = self.display_name.clone();
            next.lookup_source = self.lookup_source;
        } else if self.is_voicemail_number && !next.is_voicemail_number {
            next.is_voicemail_number = true;
            next.display_name = self.display_name.clone();
            next.lookup_source = self.lookup_source;
        }

        if next.photo.is_none()
            && next.photo_uri.is_some()
            && next.photo_uri == self.photo_uri
            && self.photo.is_some()
        {
            next.photo = self.photo.clone();
            next.photo_kind = self.photo_kind;
        }

        next
    }

    /// Overlay an enrichment result onto `self`
    ///
    /// Text fields move over only when the overlay has a non-empty value, so
    /// e.g. a geocoded `location` survives a network result that has none.
    /// The business flag and the lookup source always come from the overlay.
    pub fn overlay(&mut self, overlay: ResolvedEntry) {
        if let Some(name) = non_empty(overlay.display_name) {
            self.display_name = Some(name);
        }
        if let Some(number) = non_empty(overlay.display_number) {
            self.display_number = Some(number);
        }
        if let Some(label) = non_empty(overlay.label) {
            self.label = Some(label);
        }
        if let Some(location) = non_empty(overlay.location) {
            self.location = Some(location);
        }
        if let Some(lookup_key) = non_empty(overlay.lookup_key) {
            self.lookup_key = Some(lookup_key);
        }
        if let Some(photo_uri) = non_empty(overlay.photo_uri) {
            if self.photo_uri.as_deref() != Some(photo_uri.as_str()) {
                self.photo = None;
            }
            self.photo_uri = Some(photo_uri);
        }
        if overlay.photo_kind != PhotoKind::None && self.photo.is_none() {
            self.photo_kind = overlay.photo_kind;
        }
        self.is_business = overlay.is_business;
        self.lookup_source = overlay.lookup_source;
    }

    /// Attach fetched photo bytes
    pub fn set_photo(&mut self, bytes: Bytes) {
        self.photo = Some(bytes);
        self.photo_kind = PhotoKind::Contact;
    }
}
