//! Per-tenant delivery client registry.

use std::collections::HashMap;
use std::sync::Arc;

use notifier_storage::CredentialStore;
use tokio::sync::RwLock;

use crate::{LoadError, ProvisionError, PushProvider};

/// Process-wide map from tenant id to an initialized delivery client.
///
/// Provisioning and dispatch may interleave: `lookup` hands out a
/// point-in-time snapshot of the entry, so a client can keep serving an
/// in-flight send after its tenant is re-provisioned or unprovisioned.
pub struct TenantClients<P: PushProvider> {
    provider: P,
    clients: RwLock<HashMap<String, Arc<P::Client>>>,
}

impl<P: PushProvider> TenantClients<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Initialize a client from a credential blob and store it under the
    /// tenant id, replacing any prior client. On failure the map is left
    /// unchanged: a working client is never evicted by a bad re-provision.
    pub async fn provision(
        &self,
        app_id: &str,
        credential: &[u8],
    ) -> Result<Arc<P::Client>, ProvisionError> {
        let client = Arc::new(self.provider.initialize(credential)?);

        self.clients
            .write()
            .await
            .insert(app_id.to_string(), Arc::clone(&client));

        tracing::info!(app_id, "provisioned push client");
        Ok(client)
    }

    /// Remove the tenant's client; idempotent if absent.
    pub async fn unprovision(&self, app_id: &str) {
        if self.clients.write().await.remove(app_id).is_some() {
            tracing::info!(app_id, "unprovisioned push client");
        }
    }

    /// Snapshot read of the tenant's client.
    pub async fn lookup(&self, app_id: &str) -> Option<Arc<P::Client>> {
        self.clients.read().await.get(app_id).cloned()
    }

    pub async fn is_provisioned(&self, app_id: &str) -> bool {
        self.clients.read().await.contains_key(app_id)
    }

    /// Provision a client for every persisted tenant credential. A failure
    /// for any single tenant aborts the whole load.
    pub async fn load_all<C: CredentialStore>(&self, store: &C) -> Result<usize, LoadError> {
        let credentials = store.list_credentials().await?;
        let count = credentials.len();

        for tenant in credentials {
            self.provision(&tenant.app_id, &tenant.credential)
                .await
                .map_err(|source| LoadError::Provision {
                    app_id: tenant.app_id.clone(),
                    source,
                })?;
        }

        tracing::info!(tenants = count, "loaded push clients");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PushClient;
    use notifier_core::{MessagePayload, ProviderResponse, PushOutcome, PushTokens};
    use notifier_storage::InMemoryStore;

    /// Provider whose clients echo the credential they were built from.
    /// Credentials starting with "bad" fail initialization.
    struct EchoProvider;

    struct EchoClient {
        credential: Vec<u8>,
    }

    impl PushProvider for EchoProvider {
        type Client = EchoClient;

        fn initialize(&self, credential: &[u8]) -> Result<EchoClient, ProvisionError> {
            if credential.starts_with(b"bad") {
                return Err(ProvisionError("malformed credential".into()));
            }
            Ok(EchoClient {
                credential: credential.to_vec(),
            })
        }
    }

    impl PushClient for EchoClient {
        async fn send(
            &self,
            tokens: &PushTokens,
            _payload: &MessagePayload,
        ) -> Result<ProviderResponse, crate::SendError> {
            Ok(ProviderResponse::from_outcomes(
                tokens
                    .iter()
                    .map(|t| PushOutcome::success(t, "echo"))
                    .collect(),
            ))
        }
    }

    #[tokio::test]
    async fn test_provision_replaces_prior_client() {
        let clients = TenantClients::new(EchoProvider);
        clients.provision("a1", b"first").await.unwrap();
        clients.provision("a1", b"second").await.unwrap();

        let client = clients.lookup("a1").await.unwrap();
        assert_eq!(client.credential, b"second");
    }

    #[tokio::test]
    async fn test_failed_provision_keeps_working_client() {
        let clients = TenantClients::new(EchoProvider);
        clients.provision("a1", b"first").await.unwrap();

        let err = clients.provision("a1", b"bad blob").await;
        assert!(err.is_err());

        let client = clients.lookup("a1").await.unwrap();
        assert_eq!(client.credential, b"first");
    }

    #[tokio::test]
    async fn test_unprovision_is_idempotent() {
        let clients = TenantClients::new(EchoProvider);
        clients.provision("a1", b"first").await.unwrap();

        clients.unprovision("a1").await;
        clients.unprovision("a1").await;
        assert!(clients.lookup("a1").await.is_none());
    }

    #[tokio::test]
    async fn test_load_all_aborts_on_first_failure() {
        let store = InMemoryStore::new();
        store.upsert_credential("a1", b"good").await.unwrap();
        store.upsert_credential("a2", b"bad blob").await.unwrap();
        store.upsert_credential("a3", b"good").await.unwrap();

        let clients = TenantClients::new(EchoProvider);
        let result = clients.load_all(&store).await;

        assert!(matches!(
            result,
            Err(LoadError::Provision { ref app_id, .. }) if app_id == "a2"
        ));
        // a3 sorts after the failing tenant and must not have been loaded.
        assert!(clients.lookup("a3").await.is_none());
    }

    #[tokio::test]
    async fn test_load_all_provisions_every_tenant() {
        let store = InMemoryStore::new();
        store.upsert_credential("a1", b"one").await.unwrap();
        store.upsert_credential("a2", b"two").await.unwrap();

        let clients = TenantClients::new(EchoProvider);
        let count = clients.load_all(&store).await.unwrap();

        assert_eq!(count, 2);
        assert!(clients.is_provisioned("a1").await);
        assert!(clients.is_provisioned("a2").await);
    }
}
