//! Identity providers consumed by the dispatcher
//!
//! This module defines the abstract collaborators the cache depends on:
//! - The local (on-device) directory
//! - Secondary enterprise/remote directories and their enumeration
//! - The optional network-authoritative number lookup service
//! - Photo fetching and offline geocoding
//! - Emergency/voicemail number classification

pub mod classifier;
pub mod traits;
pub mod types;

// Re-export main types
pub use classifier::{ConfiguredClassifier, NumberClassifier};
pub use traits::{
    DirectoryIdentityProvider, DirectoryList, GeocodeService, LocalIdentityProvider,
    NetworkNumberLookupService, NoDirectories, PhotoFetcher,
};
pub use types::{ContactMatch, DirectoryHandle};
