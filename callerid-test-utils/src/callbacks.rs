//! Callback that records every notification it receives

use callerid_core::{CacheKey, ContactInfoCallback, ResolvedEntry};
use std::sync::{Arc, Mutex};

/// One recorded notification
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Info(CacheKey, ResolvedEntry),
    ImageLoaded(CacheKey, ResolvedEntry),
}

impl Recorded {
    pub fn entry(&self) -> &ResolvedEntry {
        match self {
            Recorded::Info(_, entry) | Recorded::ImageLoaded(_, entry) => entry,
        }
    }
}

/// Collects notifications in arrival order
#[derive(Default)]
pub struct RecordingCallback {
    events: Mutex<Vec<Recorded>>,
    panics: bool,
}

impl RecordingCallback {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A callback that records, then panics on every notification
    pub fn panicking() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::default(),
            panics: true,
        })
    }

    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().unwrap().clone()
    }

    /// Number of `on_contact_info` notifications
    pub fn info_count(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, Recorded::Info(..)))
            .count()
    }

    /// Number of `on_image_loaded` notifications
    pub fn image_count(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, Recorded::ImageLoaded(..)))
            .count()
    }

    /// Entry carried by the latest notification
    pub fn last_entry(&self) -> Option<ResolvedEntry> {
        self.events
            .lock()
            .unwrap()
            .last()
            .map(|e| e.entry().clone())
    }

    fn record(&self, event: Recorded) {
        self.events.lock().unwrap().push(event);
        if self.panics {
            panic!("recording callback told to panic");
        }
    }
}

impl ContactInfoCallback for RecordingCallback {
    fn on_contact_info(&self, key: &CacheKey, entry: &ResolvedEntry) {
        self.record(Recorded::Info(key.clone(), entry.clone()));
    }

    fn on_image_loaded(&self, key: &CacheKey, entry: &ResolvedEntry) {
        self.record(Recorded::ImageLoaded(key.clone(), entry.clone()));
    }
}
