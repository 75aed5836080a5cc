//! Constructors for the entries a dispatch emits

use crate::Labels;
use crate::cache::{LookupSource, PhotoKind, ResolvedEntry};
use crate::identity::ContactMatch;
use crate::query::{Presentation, PreparedNumber, RawQuery};

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Fields every entry for `query` shares, whatever produced it
fn base_entry(query: &RawQuery, prepared: Option<&PreparedNumber>) -> ResolvedEntry {
    ResolvedEntry {
        display_number: prepared.map(|p| p.display.clone()),
        forwarding_number: prepared.and_then(|p| p.forwarding.clone()),
        original_number: Some(query.phone_number.clone()),
        is_sip: prepared.is_some_and(|p| p.is_sip),
        ..Default::default()
    }
}

/// Entry for a number nobody knows: the number itself, plus the CNAP name
pub fn not_found_entry(query: &RawQuery) -> ResolvedEntry {
    let prepared = PreparedNumber::parse(&query.phone_number).ok();
    ResolvedEntry {
        display_name: query.cnap().map(str::to_string),
        ..base_entry(query, prepared.as_ref())
    }
}

/// Entry for a number that cannot be looked up at all
pub fn unknown_entry(query: &RawQuery, labels: &Labels) -> ResolvedEntry {
    let mut entry = not_found_entry(query);
    if entry.display_name.is_none() {
        entry.display_name = Some(labels.unknown.clone());
    }
    entry
}

/// Entry for a call whose number is withheld
pub fn presentation_entry(
    query: &RawQuery,
    presentation: Presentation,
    labels: &Labels,
) -> ResolvedEntry {
    let label = match presentation {
        Presentation::Restricted => &labels.private,
        Presentation::Payphone => &labels.payphone,
        Presentation::Unknown | Presentation::Allowed => &labels.unknown,
    };
    let display_name = match presentation {
        Presentation::Restricted | Presentation::Unknown => query.cnap().map(str::to_string),
        _ => None,
    }
    .unwrap_or_else(|| label.clone());

    ResolvedEntry {
        display_name: Some(display_name),
        original_number: Some(query.phone_number.clone()),
        lookup_source: LookupSource::Presentation,
        ..Default::default()
    }
}

pub fn emergency_entry(query: &RawQuery, prepared: &PreparedNumber, labels: &Labels) -> ResolvedEntry {
    ResolvedEntry {
        display_name: Some(labels.emergency.clone()),
        is_emergency_number: true,
        lookup_source: LookupSource::Emergency,
        ..base_entry(query, Some(prepared))
    }
}

pub fn voicemail_entry(query: &RawQuery, prepared: &PreparedNumber, labels: &Labels) -> ResolvedEntry {
    ResolvedEntry {
        display_name: Some(labels.voicemail.clone()),
        is_voicemail_number: true,
        lookup_source: LookupSource::Voicemail,
        ..base_entry(query, Some(prepared))
    }
}

/// First-pass entry built from a local or directory match
pub fn entry_from_match(
    query: &RawQuery,
    prepared: &PreparedNumber,
    found: ContactMatch,
    source: LookupSource,
) -> ResolvedEntry {
    let base = base_entry(query, Some(prepared));
    ResolvedEntry {
        display_name: non_empty(found.name).or_else(|| query.cnap().map(str::to_string)),
        display_number: non_empty(found.number).or(base.display_number.clone()),
        label: non_empty(found.label),
        location: non_empty(found.location),
        lookup_key: non_empty(found.lookup_key),
        photo_uri: non_empty(found.photo_uri),
        is_business: found.is_business,
        is_local_match: source == LookupSource::Local,
        lookup_source: source,
        ..base
    }
}

/// Enrichment overlay built from a network lookup
pub fn network_overlay(found: ContactMatch) -> ResolvedEntry {
    let photo_uri = non_empty(found.photo_uri);
    let photo_kind = if found.is_business && photo_uri.is_none() {
        PhotoKind::Business
    } else {
        PhotoKind::None
    };

    ResolvedEntry {
        display_name: non_empty(found.name),
        display_number: non_empty(found.number),
        label: non_empty(found.label),
        location: non_empty(found.location),
        lookup_key: non_empty(found.lookup_key),
        photo_uri,
        photo_kind,
        is_business: found.is_business,
        lookup_source: LookupSource::Network,
        ..Default::default()
    }
}
