//! Photo loading
//!
//! [`PhotoLoader`] turns fetch failures into "no photo" so the dispatcher
//! never sees an error from this stage.

use crate::error::{ProviderError, Result};
use crate::identity::PhotoFetcher;
use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, warn};
use std::sync::Arc;

/// URI scheme understood by [`FsPhotoFetcher`]
pub const FILE_SCHEME: &str = "file://";

/// Fetches photo bytes, reporting any failure as `None`
#[derive(Clone)]
pub struct PhotoLoader {
    fetcher: Arc<dyn PhotoFetcher>,
}

impl PhotoLoader {
    pub fn new(fetcher: Arc<dyn PhotoFetcher>) -> Self {
        Self { fetcher }
    }

    pub async fn load(&self, uri: &str) -> Option<Bytes> {
        match self.fetcher.fetch(uri).await {
            Ok(bytes) if bytes.is_empty() => {
                warn!("Photo at {uri} is empty");
                None
            }
            Ok(bytes) => {
                debug!("Loaded {} photo bytes from {uri}", bytes.len());
                Some(bytes)
            }
            Err(e) => {
                warn!("Photo fetch failed: {e}");
                None
            }
        }
    }
}

/// Reads photos from the local filesystem (`file://` URIs or plain paths)
#[derive(Debug, Clone, Copy, Default)]
pub struct FsPhotoFetcher;

#[async_trait]
impl PhotoFetcher for FsPhotoFetcher {
    async fn fetch(&self, uri: &str) -> Result<Bytes> {
        if uri.contains("://") && !uri.starts_with(FILE_SCHEME) {
            return Err(ProviderError::fetch(uri, "unsupported URI scheme").into());
        }
        let path = uri.strip_prefix(FILE_SCHEME).unwrap_or(uri);
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ProviderError::fetch(uri, e.to_string()))?;
        Ok(Bytes::from(bytes))
    }
}
