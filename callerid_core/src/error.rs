//! Error types for the caller identity core library
//!
//! Errors are organized into logical categories. None of them cross the
//! `resolve` / callback boundary of the cache: providers report failures with
//! these types, and the dispatcher turns them into "no match" results.

use thiserror::Error;

pub mod internal;
pub mod provider;
pub mod validation;

pub use self::provider::ProviderError;
pub use self::validation::ValidationError;
pub use internal::InternalError;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the caller identity core library
///
/// Errors are categorized into three main types:
/// - Provider errors: an identity provider, photo fetcher or geocoder failed
/// - Validation errors: malformed input or configuration
/// - Internal errors: library internal failures (callbacks, runtime, tasks)
#[derive(Error, Debug)]
pub enum Error {
    /// Provider related errors
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Validation related errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Internal library errors
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl Error {
    /// Whether the dispatcher may treat this error as a plain "no match"
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Provider(_) => true,
            Self::Validation(err) => matches!(err, ValidationError::MalformedNumber { .. }),
            Self::Internal(err) => err.is_recoverable(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Provider(ProviderError::unavailable("io", &source.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;
    use std::io;
    use std::time::Duration;

    #[test]
    fn test_provider_unavailable_error() {
        let error = Error::Provider(ProviderError::unavailable("local", "cursor closed"));

        assert!(matches!(
            error,
            Error::Provider(ProviderError::Unavailable { .. })
        ));
        assert!(error.to_string().contains("local"));
        assert!(error.to_string().contains("cursor closed"));
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_provider_timeout_error() {
        let error = Error::Provider(ProviderError::timeout("directory", Duration::from_secs(5)));

        assert!(error.to_string().contains("timed out"));
        assert!(error.to_string().contains("directory"));
    }

    #[test]
    fn test_malformed_number_is_recoverable() {
        let error = Error::Validation(ValidationError::malformed_number("empty number"));

        assert!(error.is_recoverable());
        assert!(error.to_string().contains("Malformed phone number"));
    }

    #[test]
    fn test_invalid_configuration_is_not_recoverable() {
        let error = Error::Validation(ValidationError::invalid_configuration("no labels"));

        assert!(!error.is_recoverable());
        assert!(error.to_string().contains("Invalid configuration"));
    }

    #[test]
    fn test_no_runtime_error() {
        let error = Error::Internal(InternalError::NoRuntime);

        assert!(!error.is_recoverable());
        assert!(error.to_string().contains("tokio runtime"));
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "photo missing");
        let error: Error = io_error.into();

        match error {
            Error::Provider(ProviderError::Unavailable { provider, reason }) => {
                assert_eq!(provider, "io");
                assert!(reason.contains("photo missing"));
            }
            _ => panic!("Expected Provider::Unavailable error"),
        }
    }

    #[test]
    fn test_error_trait_implementation() {
        let error = Error::Internal(InternalError::callback_panicked("call-1"));

        // Should compile if Error implements std::error::Error
        let _: &dyn StdError = &error;
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
