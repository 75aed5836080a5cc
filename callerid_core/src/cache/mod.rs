//! Contact cache: resolved entries, query versioning and callback fan-in
//!
//! This module provides:
//! - [`ResolvedEntry`] and its replace/overlay merge rules
//! - [`QueryToken`] stamps used to drop results from superseded dispatches
//! - The callback registry shared by concurrent `resolve` calls for one key
//! - [`ContactCache`], the single coordination point for all of the above

pub mod callbacks;
pub mod entry;
pub mod registry;
pub mod service;
pub mod token;

pub use callbacks::{ChannelCallback, ContactEvent, ContactInfoCallback, FnCallback};
pub use entry::{LookupSource, PhotoKind, ResolvedEntry};
pub use registry::PendingCallbackSet;
pub use service::{ContactCache, StageOutcome, needs_force_query};
pub use token::QueryToken;

use serde::Serialize;

/// Point-in-time counters for a cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entry_count: usize,
    pub in_flight: usize,
    pub dispatches_started: u64,
    pub stages_applied: u64,
    pub stale_dropped: u64,
}
