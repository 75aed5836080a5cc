//! Provider trait definitions
//!
//! Every lookup may suspend; the dispatcher always calls them from worker
//! tasks, never from the context that called `resolve`.

use crate::error::Result;
use crate::identity::types::{ContactMatch, DirectoryHandle};
use async_trait::async_trait;
use bytes::Bytes;

/// The on-device directory
#[async_trait]
pub trait LocalIdentityProvider: Send + Sync {
    /// Find the identity behind `number`
    ///
    /// Returns `Ok(Some(match))` if a contact exists, `Ok(None)` if not, or an
    /// error if the provider failed. Errors are treated as "no match".
    async fn lookup(&self, number: &str, country_iso: &str) -> Result<Option<ContactMatch>>;
}

/// Enumerates the configured secondary directories
#[async_trait]
pub trait DirectoryList: Send + Sync {
    async fn enumerate(&self) -> Result<Vec<DirectoryHandle>>;
}

/// Answers lookups scoped to one secondary directory
#[async_trait]
pub trait DirectoryIdentityProvider: Send + Sync {
    async fn lookup(
        &self,
        number: &str,
        directory: &DirectoryHandle,
    ) -> Result<Option<ContactMatch>>;
}

/// Network-authoritative phone number lookup (reverse lookup service)
#[async_trait]
pub trait NetworkNumberLookupService: Send + Sync {
    async fn lookup(&self, number: &str) -> Result<Option<ContactMatch>>;
}

/// Retrieves the bytes behind a photo URI
///
/// Must be safe to call concurrently for different URIs.
#[async_trait]
pub trait PhotoFetcher: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<Bytes>;
}

/// Offline geographic description of a number ("San Francisco, CA")
pub trait GeocodeService: Send + Sync {
    fn describe(&self, number: &str, country_iso: &str) -> Option<String>;
}

/// Directory list and provider for setups without secondary directories
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDirectories;

#[async_trait]
impl DirectoryList for NoDirectories {
    async fn enumerate(&self) -> Result<Vec<DirectoryHandle>> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl DirectoryIdentityProvider for NoDirectories {
    async fn lookup(
        &self,
        _number: &str,
        _directory: &DirectoryHandle,
    ) -> Result<Option<ContactMatch>> {
        Ok(None)
    }
}
