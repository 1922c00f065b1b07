// Typed errors with thiserror. Surface meaningful messages to JS.
// The two selector misses are non-fatal: they are reported as warnings and the trigger stays idle.

use thiserror::Error;

/// Embed error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LazyEmbedError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Parent element with selector \"{selector}\" not found.")]
    ParentNotFound { selector: String },

    #[error("No elements found matching selector \"{selector}\"")]
    NoClickTargets { selector: String },

    #[error("Host error while arming {trigger} trigger: {message}")]
    Host {
        trigger: &'static str,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl LazyEmbedError {
    pub fn host(trigger: &'static str, message: impl Into<String>) -> Self {
        LazyEmbedError::Host {
            trigger,
            message: message.into(),
        }
    }

    /// Whether the condition only disables one trigger and leaves the component usable.
    pub fn is_non_fatal(&self) -> bool {
        matches!(
            self,
            LazyEmbedError::ParentNotFound { .. }
                | LazyEmbedError::NoClickTargets { .. }
                | LazyEmbedError::Host { .. }
        )
    }
}

impl From<serde_json::Error> for LazyEmbedError {
    fn from(err: serde_json::Error) -> Self {
        LazyEmbedError::Serialization(err.to_string())
    }
}
