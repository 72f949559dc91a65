//! Store failure signal.

use thiserror::Error;

/// Generic store failure carrying a diagnostic message. The core never
/// retries these; the message surfaces as the envelope's detail.
#[derive(Debug, Clone, Error)]
#[error("storage failure: {message}")]
pub struct StoreError {
    message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<diesel::r2d2::PoolError> for StoreError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        Self::new(err.to_string())
    }
}
