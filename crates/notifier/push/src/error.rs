//! Push delivery errors.

use notifier_storage::StoreError;
use thiserror::Error;

/// The credential blob was structurally invalid for the delivery provider.
#[derive(Debug, Clone, Error)]
#[error("invalid push credential: {0}")]
pub struct ProvisionError(pub String);

/// The delivery provider rejected or failed the send as a whole. Per-token
/// failures are reported inside the provider response instead.
#[derive(Debug, Clone, Error)]
#[error("push delivery failed: {0}")]
pub struct SendError(pub String);

/// Startup credential load failure. Any single tenant failing aborts the
/// whole load; there is no partial or best-effort startup state.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("provisioning {app_id} failed: {source}")]
    Provision {
        app_id: String,
        #[source]
        source: ProvisionError,
    },
}
