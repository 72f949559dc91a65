//! Service errors.

use notifier_core::ErrorEnvelope;
use notifier_push::{ProvisionError, SendError};
use notifier_storage::StoreError;
use thiserror::Error;

/// Failure of a notify request. Every variant is recovered at the transport
/// boundary and converted into the envelope shape; nothing propagates past
/// the public contract.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// One entry per failed precondition, accumulated before resolution.
    #[error("invalid notify request")]
    Invalid(ErrorEnvelope),

    #[error("device {device_id} not found in {app_id}")]
    DeviceNotFound { device_id: String, app_id: String },

    #[error("user {user_id} not found in {app_id}")]
    UserNotFound { user_id: String, app_id: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Send(#[from] SendError),
}

/// Failure of a tenant provisioning request.
#[derive(Debug, Error)]
pub enum ProvisionFailure {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Init(#[from] ProvisionError),
}
