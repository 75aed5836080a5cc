//! Mock photo fetcher and geocoder

use async_trait::async_trait;
use bytes::Bytes;
use callerid_core::error::ProviderError;
use callerid_core::{GeocodeService, PhotoFetcher, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct PhotoBehavior {
    photos: HashMap<String, Bytes>,
    delay: Duration,
    calls: Vec<String>,
}

/// Mock photo source; unknown URIs fail like a broken link
#[derive(Clone, Default)]
pub struct MockPhotoFetcher {
    behavior: Arc<Mutex<PhotoBehavior>>,
}

impl MockPhotoFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_photo(self, uri: &str, bytes: &'static [u8]) -> Self {
        self.behavior
            .lock()
            .unwrap()
            .photos
            .insert(uri.to_string(), Bytes::from_static(bytes));
        self
    }

    pub fn set_delay(&self, delay: Duration) {
        self.behavior.lock().unwrap().delay = delay;
    }

    pub fn call_count(&self) -> usize {
        self.behavior.lock().unwrap().calls.len()
    }
}

#[async_trait]
impl PhotoFetcher for MockPhotoFetcher {
    async fn fetch(&self, uri: &str) -> Result<Bytes> {
        let (delay, found) = {
            let mut behavior = self.behavior.lock().unwrap();
            behavior.calls.push(uri.to_string());
            (behavior.delay, behavior.photos.get(uri).cloned())
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        found.ok_or_else(|| ProviderError::fetch(uri, "not found").into())
    }
}

/// Mock geocoder returning one fixed description
#[derive(Default)]
pub struct MockGeocoder {
    description: Option<String>,
    calls: AtomicUsize,
}

impl MockGeocoder {
    pub fn new(description: &str) -> Self {
        Self {
            description: Some(description.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// A geocoder that knows no region
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GeocodeService for MockGeocoder {
    fn describe(&self, _number: &str, _country_iso: &str) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.description.clone()
    }
}
