//! Provider related error types

use std::time::Duration;
use thiserror::Error;

/// Errors reported by identity providers and other consumed collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider threw, was unreachable, or returned garbage
    #[error("Provider '{provider}' unavailable: {reason}")]
    Unavailable { provider: String, reason: String },

    /// The provider did not answer in time
    #[error("Provider '{provider}' timed out after {after:?}")]
    Timeout { provider: String, after: Duration },

    /// Photo bytes could not be read
    #[error("Failed to fetch '{uri}': {reason}")]
    Fetch { uri: String, reason: String },
}

impl ProviderError {
    /// Create an unavailable provider error
    pub fn unavailable(provider: &str, reason: &str) -> Self {
        Self::Unavailable {
            provider: provider.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a provider timeout error
    pub fn timeout(provider: &str, after: Duration) -> Self {
        Self::Timeout {
            provider: provider.to_string(),
            after,
        }
    }

    /// Create a photo fetch error
    pub fn fetch(uri: &str, reason: impl Into<String>) -> Self {
        Self::Fetch {
            uri: uri.to_string(),
            reason: reason.into(),
        }
    }
}
