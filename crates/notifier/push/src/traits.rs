//! Delivery-provider traits.

use notifier_core::{MessagePayload, ProviderResponse, PushTokens};

use crate::{ProvisionError, SendError};

/// Constructs delivery clients from opaque tenant credentials.
pub trait PushProvider: Send + Sync {
    type Client: PushClient + Send + Sync + 'static;

    /// Build a client from a credential blob. Fails when the blob is
    /// structurally invalid for the provider.
    fn initialize(&self, credential: &[u8]) -> Result<Self::Client, ProvisionError>;
}

/// A tenant's initialized delivery handle.
#[trait_variant::make(Send)]
pub trait PushClient: Send + Sync {
    /// Deliver one payload to the addressed tokens and return the provider's
    /// response. An empty token set succeeds trivially.
    async fn send(
        &self,
        tokens: &PushTokens,
        payload: &MessagePayload,
    ) -> Result<ProviderResponse, SendError>;
}
