//! Tenant provisioning: persisting delivery credentials and keeping the
//! live client registry in step.

use std::sync::Arc;

use notifier_push::{PushProvider, TenantClients};
use notifier_storage::{CredentialStore, StoreError};

use crate::ProvisionFailure;

/// Whether a tenant has a live client and a persisted credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantStatus {
    pub live: bool,
    pub stored: bool,
}

/// Provisioning operations over the credential store and the client
/// registry.
pub struct Provisioner<C, P: PushProvider> {
    credentials: C,
    clients: Arc<TenantClients<P>>,
}

impl<C: CredentialStore, P: PushProvider> Provisioner<C, P> {
    pub fn new(credentials: C, clients: Arc<TenantClients<P>>) -> Self {
        Self {
            credentials,
            clients,
        }
    }

    /// Persist the credential, then initialize the tenant's client. A failed
    /// initialization leaves both the persisted credential and any
    /// previously working client in place.
    pub async fn provision(&self, app_id: &str, credential: &[u8]) -> Result<(), ProvisionFailure> {
        self.credentials
            .upsert_credential(app_id, credential)
            .await?;
        self.clients.provision(app_id, credential).await?;
        Ok(())
    }

    /// Delete the credential and evict the live client; idempotent.
    pub async fn unprovision(&self, app_id: &str) -> Result<(), StoreError> {
        self.credentials.delete_credential(app_id).await?;
        self.clients.unprovision(app_id).await;
        Ok(())
    }

    pub async fn status(&self, app_id: &str) -> Result<TenantStatus, StoreError> {
        let stored = self.credentials.find_credential(app_id).await?.is_some();
        let live = self.clients.is_provisioned(app_id).await;
        Ok(TenantStatus { live, stored })
    }
}
