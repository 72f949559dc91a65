//! APNs delivery implementation using the a2 crate.

use a2::NotificationBuilder as _;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use notifier_core::{MessagePayload, ProviderResponse, PushOutcome, PushTokens};
use serde::Deserialize;

use crate::{ProvisionError, PushClient, PushProvider, SendError};

/// Credential blob for a tenant: base64 PKCS12 bundle plus its password.
#[derive(Debug, Deserialize)]
struct ApnsCredential {
    p12: String,
    password: String,
    #[serde(default)]
    sandbox: bool,
    #[serde(default)]
    topic: Option<String>,
}

/// Provider constructing APNs clients with certificate authentication.
#[derive(Debug, Clone, Default)]
pub struct ApnsProvider;

impl ApnsProvider {
    pub fn new() -> Self {
        Self
    }
}

impl PushProvider for ApnsProvider {
    type Client = ApnsClient;

    fn initialize(&self, credential: &[u8]) -> Result<ApnsClient, ProvisionError> {
        let cred: ApnsCredential = serde_json::from_slice(credential)
            .map_err(|e| ProvisionError(format!("credential is not valid JSON: {e}")))?;

        let pkcs12_der = BASE64
            .decode(cred.p12.as_bytes())
            .map_err(|e| ProvisionError(format!("p12 is not valid base64: {e}")))?;

        let config = if cred.sandbox {
            a2::ClientConfig::new(a2::Endpoint::Sandbox)
        } else {
            a2::ClientConfig::default()
        };

        let mut cursor = std::io::Cursor::new(pkcs12_der);
        let client = a2::Client::certificate(&mut cursor, &cred.password, config)
            .map_err(|e| ProvisionError(format!("failed to create APNs client: {e}")))?;

        Ok(ApnsClient {
            client,
            topic: cred.topic,
        })
    }
}

/// One tenant's APNs handle.
pub struct ApnsClient {
    client: a2::Client,
    topic: Option<String>,
}

impl PushClient for ApnsClient {
    async fn send(
        &self,
        tokens: &PushTokens,
        payload: &MessagePayload,
    ) -> Result<ProviderResponse, SendError> {
        let mut results = Vec::with_capacity(tokens.count());

        for token in tokens.iter() {
            let outcome = self.send_single(token, payload).await?;
            results.push(outcome);
        }

        Ok(ProviderResponse::from_outcomes(results))
    }
}

impl ApnsClient {
    async fn send_single(
        &self,
        token: &str,
        payload: &MessagePayload,
    ) -> Result<PushOutcome, SendError> {
        let notification = a2::DefaultNotificationBuilder::new()
            .set_title(&payload.notification.title)
            .set_body(&payload.notification.body)
            .build(
                token,
                a2::NotificationOptions {
                    apns_topic: self.topic.as_deref(),
                    ..Default::default()
                },
            );

        let mut apns_payload = notification;
        apns_payload
            .add_custom_data("data", &payload.data)
            .map_err(|e| SendError(format!("payload serialization failed: {e}")))?;
        apns_payload
            .add_custom_data("icon", &payload.notification.icon)
            .map_err(|e| SendError(format!("payload serialization failed: {e}")))?;
        if let Some(tag) = &payload.notification.tag {
            apns_payload
                .add_custom_data("tag", tag)
                .map_err(|e| SendError(format!("payload serialization failed: {e}")))?;
        }

        match self.client.send(apns_payload).await {
            Ok(response) => {
                let apns_id = response.apns_id.unwrap_or_default();
                Ok(PushOutcome::success(token, apns_id))
            }
            Err(e) => Ok(PushOutcome::failure(token, e)),
        }
    }
}
