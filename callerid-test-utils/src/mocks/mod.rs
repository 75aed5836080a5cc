//! Mock implementations for testing

mod dispatcher;
mod media;
mod providers;

pub use dispatcher::ManualDispatcher;
pub use media::{MockGeocoder, MockPhotoFetcher};
pub use providers::{MockDirectories, MockDirectory, MockLocalProvider, MockNetworkService};
