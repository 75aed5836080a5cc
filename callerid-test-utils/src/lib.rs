//! Test utilities for the caller identity cache
//!
//! This crate provides mock identity providers, a hand-driven dispatcher,
//! recording callbacks and builders for testing the cache and dispatcher.

pub mod builders;
pub mod callbacks;
pub mod mocks;

// Re-export commonly used types
pub use builders::{TestEntryBuilder, TestMatchBuilder};
pub use callbacks::{Recorded, RecordingCallback};
pub use mocks::{
    ManualDispatcher, MockDirectories, MockDirectory, MockGeocoder, MockLocalProvider,
    MockNetworkService, MockPhotoFetcher,
};
