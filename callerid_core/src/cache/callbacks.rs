//! Listener abstractions for resolution updates
//!
//! The cache reports through a trait object so callers can plug in whatever
//! delivery mechanism suits them. [`ChannelCallback`] forwards updates into
//! a tokio channel for async consumers, [`FnCallback`] wraps a closure.

use crate::cache::entry::ResolvedEntry;
use crate::error::InternalError;
use crate::query::CacheKey;
use log::error;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Receives resolution updates for one or more cache keys
pub trait ContactInfoCallback: Send + Sync {
    /// A new or updated entry is available for `key`
    fn on_contact_info(&self, key: &CacheKey, entry: &ResolvedEntry);

    /// Photo bytes were attached to the entry for `key`
    fn on_image_loaded(&self, key: &CacheKey, entry: &ResolvedEntry) {
        let _ = (key, entry);
    }
}

/// Update delivered by [`ChannelCallback`]
#[derive(Debug, Clone, PartialEq)]
pub enum ContactEvent {
    Info { key: CacheKey, entry: ResolvedEntry },
    ImageLoaded { key: CacheKey, entry: ResolvedEntry },
}

impl ContactEvent {
    pub fn key(&self) -> &CacheKey {
        match self {
            ContactEvent::Info { key, .. } | ContactEvent::ImageLoaded { key, .. } => key,
        }
    }

    pub fn entry(&self) -> &ResolvedEntry {
        match self {
            ContactEvent::Info { entry, .. } | ContactEvent::ImageLoaded { entry, .. } => entry,
        }
    }
}

/// Adapter that turns callback invocations into channel messages
pub struct ChannelCallback {
    tx: mpsc::UnboundedSender<ContactEvent>,
}

impl ChannelCallback {
    pub fn new(tx: mpsc::UnboundedSender<ContactEvent>) -> Self {
        Self { tx }
    }

    /// Create a callback together with the receiving end of its channel
    pub fn channel() -> (Arc<Self>, mpsc::UnboundedReceiver<ContactEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self::new(tx)), rx)
    }
}

impl ContactInfoCallback for ChannelCallback {
    fn on_contact_info(&self, key: &CacheKey, entry: &ResolvedEntry) {
        // Receiver gone means nobody is listening any more
        let _ = self.tx.send(ContactEvent::Info {
            key: key.clone(),
            entry: entry.clone(),
        });
    }

    fn on_image_loaded(&self, key: &CacheKey, entry: &ResolvedEntry) {
        let _ = self.tx.send(ContactEvent::ImageLoaded {
            key: key.clone(),
            entry: entry.clone(),
        });
    }
}

/// Closure-backed callback that only listens for contact info
pub struct FnCallback<F> {
    f: F,
}

impl<F> FnCallback<F>
where
    F: Fn(&CacheKey, &ResolvedEntry) + Send + Sync,
{
    pub fn new(f: F) -> Arc<Self> {
        Arc::new(Self { f })
    }
}

impl<F> ContactInfoCallback for FnCallback<F>
where
    F: Fn(&CacheKey, &ResolvedEntry) + Send + Sync,
{
    fn on_contact_info(&self, key: &CacheKey, entry: &ResolvedEntry) {
        (self.f)(key, entry)
    }
}

/// Which callback method a notification goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Notification {
    Info,
    ImageLoaded,
}

/// Invoke every callback, containing panics so one listener cannot starve the rest
///
/// Returns how many callbacks panicked.
pub(crate) fn notify_all(
    callbacks: &[Arc<dyn ContactInfoCallback>],
    kind: Notification,
    key: &CacheKey,
    entry: &ResolvedEntry,
) -> usize {
    let mut failures = 0;
    for callback in callbacks {
        let result = catch_unwind(AssertUnwindSafe(|| match kind {
            Notification::Info => callback.on_contact_info(key, entry),
            Notification::ImageLoaded => callback.on_image_loaded(key, entry),
        }));
        if result.is_err() {
            failures += 1;
            error!("{}", InternalError::callback_panicked(key.as_str()));
        }
    }
    failures
}
