//! Notification resolution and dispatch.
//!
//! Each request walks validate -> resolve tokens -> dispatch -> respond,
//! short-circuiting into a `NotifyError` at any stage. Validation collects
//! every failed precondition before giving up; later stages fail
//! individually.

use std::sync::Arc;

use notifier_core::{
    Code, ErrorEntry, ErrorEnvelope, NotifyBody, ProviderResponse, PushTokens, codes,
};
use notifier_push::{PushClient as _, PushProvider, TenantClients};
use notifier_storage::TargetStore;
use serde_json::json;

use crate::{NotifyError, TargetRegistry};

/// Resolves notify requests into token sets and dispatches them through the
/// tenant's delivery client.
pub struct Notifier<S, P: PushProvider> {
    registry: TargetRegistry<S>,
    clients: Arc<TenantClients<P>>,
}

fn require(value: Option<String>, code: Code, envelope: &mut ErrorEnvelope) -> Option<String> {
    match value {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            envelope.push(code);
            None
        }
    }
}

impl<S: TargetStore, P: PushProvider> Notifier<S, P> {
    pub fn new(registry: TargetRegistry<S>, clients: Arc<TenantClients<P>>) -> Self {
        Self { registry, clients }
    }

    /// Check tenant id, selector, and tenant client in one pass, reporting
    /// every missing precondition together.
    async fn validate(
        &self,
        app_id: Option<String>,
        selector: Option<String>,
        selector_code: Code,
    ) -> Result<(String, String, Arc<P::Client>), NotifyError> {
        let mut envelope = ErrorEnvelope::new();

        let app_id = require(app_id, codes::APP_ID_REQUIRED, &mut envelope);
        let selector = require(selector, selector_code, &mut envelope);

        let client = match app_id.as_deref() {
            Some(app) => self.clients.lookup(app).await,
            None => None,
        };
        if client.is_none() {
            let app = app_id.as_deref().unwrap_or("unknown");
            envelope.push(ErrorEntry::new(codes::PUSH_CLIENT_NOT_FOUND).with_meta(json!({
                "missing": format!("push client for {app} not found"),
            })));
        }

        match (app_id, selector, client) {
            (Some(app_id), Some(selector), Some(client)) => Ok((app_id, selector, client)),
            _ => Err(NotifyError::Invalid(envelope)),
        }
    }

    /// Notify the single device owning `device_id` within the tenant.
    pub async fn notify_device(
        &self,
        app_id: Option<String>,
        device_id: Option<String>,
        body: Option<NotifyBody>,
    ) -> Result<ProviderResponse, NotifyError> {
        let (app_id, device_id, client) = self
            .validate(app_id, device_id, codes::DEVICE_ID_REQUIRED)
            .await?;
        let payload = body.unwrap_or_default().into_payload();

        let target = self
            .registry
            .find_token_by_device(&device_id, &app_id)
            .await?;
        let Some(target) = target else {
            return Err(NotifyError::DeviceNotFound { device_id, app_id });
        };
        // The store matched on membership only; scan for the exact device.
        let Some(device) = target.device(&device_id) else {
            return Err(NotifyError::DeviceNotFound { device_id, app_id });
        };

        let tokens = PushTokens::Single(device.register_token.clone());
        tracing::info!(app_id = %app_id, device_id = %device_id, "dispatching device notification");
        Ok(client.send(&tokens, &payload).await?)
    }

    /// Notify every device registered to a user. A user with no devices
    /// dispatches an empty token set, which succeeds trivially.
    pub async fn notify_user(
        &self,
        app_id: Option<String>,
        user_id: Option<String>,
        body: Option<NotifyBody>,
    ) -> Result<ProviderResponse, NotifyError> {
        let (app_id, user_id, client) = self
            .validate(app_id, user_id, codes::USER_ID_REQUIRED)
            .await?;
        let payload = body.unwrap_or_default().into_payload();

        let target = self.registry.find_tokens_by_user(&user_id, &app_id).await?;
        let Some(target) = target else {
            return Err(NotifyError::UserNotFound { user_id, app_id });
        };

        let tokens = PushTokens::Many(target.register_tokens());
        tracing::info!(app_id = %app_id, user_id = %user_id, recipients = tokens.count(), "dispatching user notification");
        Ok(client.send(&tokens, &payload).await?)
    }

    /// Notify every subscriber of a topic, minus the body's excluded users.
    /// Zero matching targets is not an error.
    pub async fn notify_topic(
        &self,
        app_id: Option<String>,
        topic: Option<String>,
        body: Option<NotifyBody>,
    ) -> Result<ProviderResponse, NotifyError> {
        let (app_id, topic, client) = self
            .validate(app_id, topic, codes::TOPIC_REQUIRED)
            .await?;
        let body = body.unwrap_or_default();
        let exclude_users = body.exclude_users();
        let payload = body.into_payload();

        let found = self
            .registry
            .find_tokens_by_topic(&topic, &app_id, exclude_users)
            .await?;
        let tokens = PushTokens::Many(
            found
                .iter()
                .flat_map(|target| target.register_tokens())
                .collect(),
        );

        tracing::info!(app_id = %app_id, topic = %topic, recipients = tokens.count(), "dispatching topic notification");
        Ok(client.send(&tokens, &payload).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeviceRegistration;
    use notifier_core::{MessagePayload, PushOutcome, Target, TargetKey};
    use notifier_push::{ProvisionError, PushClient, SendError};
    use notifier_storage::{InMemoryStore, TargetStore as _};
    use std::sync::Mutex;

    struct RecordingProvider;

    #[derive(Default)]
    struct RecordingClient {
        sent: Mutex<Vec<(PushTokens, MessagePayload)>>,
    }

    impl PushProvider for RecordingProvider {
        type Client = RecordingClient;

        fn initialize(&self, _credential: &[u8]) -> Result<RecordingClient, ProvisionError> {
            Ok(RecordingClient::default())
        }
    }

    impl PushClient for RecordingClient {
        async fn send(
            &self,
            tokens: &PushTokens,
            payload: &MessagePayload,
        ) -> Result<ProviderResponse, SendError> {
            self.sent
                .lock()
                .unwrap()
                .push((tokens.clone(), payload.clone()));
            Ok(ProviderResponse::from_outcomes(
                tokens
                    .iter()
                    .map(|t| PushOutcome::success(t, "id"))
                    .collect(),
            ))
        }
    }

    struct Fixture {
        store: InMemoryStore,
        notifier: Notifier<InMemoryStore, RecordingProvider>,
        client: Arc<RecordingClient>,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let clients = Arc::new(TenantClients::new(RecordingProvider));
        let client = clients.provision("a1", b"{}").await.unwrap();
        let notifier = Notifier::new(TargetRegistry::new(store.clone()), clients);
        Fixture {
            store,
            notifier,
            client,
        }
    }

    fn registration(device_id: &str, token: &str) -> DeviceRegistration {
        DeviceRegistration {
            device_id: device_id.into(),
            token: token.into(),
            model: "m".into(),
            platform: "p".into(),
        }
    }

    async fn register(fx: &Fixture, user: &str, device: &str, token: &str) {
        TargetRegistry::new(fx.store.clone())
            .upsert_device(user, "a1", registration(device, token))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_device_notification_carries_default_payload() {
        let fx = fixture().await;
        register(&fx, "u1", "d1", "t1").await;

        fx.notifier
            .notify_device(Some("a1".into()), Some("d1".into()), None)
            .await
            .unwrap();

        let sent = fx.client.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (tokens, payload) = &sent[0];
        assert_eq!(*tokens, PushTokens::Single("t1".into()));
        assert_eq!(payload.notification.title, "Tribeca says");
        assert_eq!(
            payload.notification.body,
            "You have received a Tribeca notification."
        );
        assert_eq!(payload.notification.icon, "icon");
        assert_eq!(payload.notification.tag, None);
        assert!(payload.data.is_empty());
    }

    #[tokio::test]
    async fn test_validation_reports_every_missing_precondition() {
        let fx = fixture().await;

        let err = fx.notifier.notify_device(None, None, None).await;
        let Err(NotifyError::Invalid(envelope)) = err else {
            panic!("expected validation failure");
        };

        let reported: Vec<u16> = envelope.errors.iter().map(|e| e.code).collect();
        assert_eq!(reported, vec![1001, 1005, 5003]);
    }

    #[tokio::test]
    async fn test_unprovisioned_tenant_fails_validation() {
        let fx = fixture().await;
        register(&fx, "u1", "d1", "t1").await;

        let err = fx
            .notifier
            .notify_device(Some("other-app".into()), Some("d1".into()), None)
            .await;
        let Err(NotifyError::Invalid(envelope)) = err else {
            panic!("expected validation failure");
        };
        assert_eq!(envelope.errors.len(), 1);
        assert_eq!(envelope.errors[0].code, 5003);
        assert_eq!(
            envelope.errors[0].meta["missing"],
            "push client for other-app not found"
        );
    }

    #[tokio::test]
    async fn test_unknown_device_is_not_found() {
        let fx = fixture().await;

        let err = fx
            .notifier
            .notify_device(Some("a1".into()), Some("ghost".into()), None)
            .await;
        assert!(matches!(err, Err(NotifyError::DeviceNotFound { .. })));
        assert!(fx.client.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let fx = fixture().await;

        let err = fx
            .notifier
            .notify_user(Some("a1".into()), Some("ghost".into()), None)
            .await;
        assert!(matches!(err, Err(NotifyError::UserNotFound { .. })));
    }

    #[tokio::test]
    async fn test_user_with_no_devices_dispatches_empty_token_set() {
        let fx = fixture().await;
        fx.store
            .insert_one(Target::new(&TargetKey::new("u1", "a1")))
            .await
            .unwrap();

        let response = fx
            .notifier
            .notify_user(Some("a1".into()), Some("u1".into()), None)
            .await
            .unwrap();

        assert_eq!(response.success_count, 0);
        let sent = fx.client.sent.lock().unwrap();
        assert_eq!(sent[0].0, PushTokens::Many(vec![]));
    }

    #[tokio::test]
    async fn test_topic_fan_out_excludes_listed_users_in_stable_order() {
        let fx = fixture().await;
        let registry = TargetRegistry::new(fx.store.clone());
        for (user, device, token) in [("u1", "d1", "t1"), ("u2", "d2", "t2"), ("u3", "d3", "t3")] {
            register(&fx, user, device, token).await;
            registry.add_topics(user, "a1", "news".into()).await.unwrap();
        }

        let body = NotifyBody {
            exclude_users: Some(vec!["u2".into()]),
            ..Default::default()
        };
        fx.notifier
            .notify_topic(Some("a1".into()), Some("news".into()), Some(body))
            .await
            .unwrap();

        let sent = fx.client.sent.lock().unwrap();
        assert_eq!(
            sent[0].0,
            PushTokens::Many(vec!["t1".into(), "t3".into()])
        );
    }

    #[tokio::test]
    async fn test_topic_without_subscribers_succeeds_with_zero_recipients() {
        let fx = fixture().await;

        let response = fx
            .notifier
            .notify_topic(Some("a1".into()), Some("empty-topic".into()), None)
            .await
            .unwrap();

        assert_eq!(response.success_count, 0);
        assert_eq!(response.failure_count, 0);
    }
}
