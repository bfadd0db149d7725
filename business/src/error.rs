use thiserror::Error;

/// Failure reported by a directory subscription.
///
/// The message comes verbatim from the store's error callback and is shown
/// to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("{0}")]
    Subscription(String),
}

impl DirectoryError {
    pub fn message(&self) -> &str {
        match self {
            Self::Subscription(message) => message,
        }
    }
}

/// Errors raised by concrete document stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no Tokio runtime is available to drive the listener")]
    NoRuntime,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Firestore returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode runQuery response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("failed to read configuration from environment: {0}")]
    Env(String),

    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role `{0}`, expected `alumni` or `student`")]
pub struct ParseRoleError(pub String);
