//! Internal library error types

use thiserror::Error;

/// Internal library errors
#[derive(Error, Debug)]
pub enum InternalError {
    /// A registered callback panicked while being notified
    #[error("Callback for key '{key}' panicked")]
    CallbackPanicked { key: String },

    /// A dispatch task panicked before emitting its final stage
    #[error("Dispatch for key '{key}' panicked")]
    DispatchPanicked { key: String },

    /// The cache was constructed outside of a tokio runtime
    #[error("No tokio runtime available to run dispatches")]
    NoRuntime,
}

impl InternalError {
    /// Create a callback panic error
    pub fn callback_panicked(key: &str) -> Self {
        Self::CallbackPanicked {
            key: key.to_string(),
        }
    }

    /// Create a dispatch panic error
    pub fn dispatch_panicked(key: &str) -> Self {
        Self::DispatchPanicked {
            key: key.to_string(),
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::CallbackPanicked { .. } | Self::DispatchPanicked { .. }
        )
    }
}
