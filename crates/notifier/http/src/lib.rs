//! Notifier HTTP Layer
//!
//! Thin axum controllers mapping requests onto the registry, resolver, and
//! provisioning services. The tenant id travels in the `X-App-Id` header.

mod admin;
mod error;
mod notify;
mod register;
mod topics;

pub use error::*;

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::http::HeaderMap;
use axum::routing::{delete, get, post};
use serde::de::DeserializeOwned;

use notifier_push::{PushProvider, TenantClients};
use notifier_service::{Notifier, Provisioner, TargetRegistry};
use notifier_storage::Storage;

/// Shared handler state: one registry, resolver, and provisioner over the
/// same storage backend and tenant client table.
pub struct AppState<St, P: PushProvider> {
    pub targets: TargetRegistry<St>,
    pub notifier: Arc<Notifier<St, P>>,
    pub provisioner: Arc<Provisioner<St, P>>,
}

impl<St, P> AppState<St, P>
where
    St: Storage + Clone,
    P: PushProvider,
{
    pub fn new(store: St, clients: Arc<TenantClients<P>>) -> Self {
        Self {
            targets: TargetRegistry::new(store.clone()),
            notifier: Arc::new(Notifier::new(
                TargetRegistry::new(store.clone()),
                Arc::clone(&clients),
            )),
            provisioner: Arc::new(Provisioner::new(store, clients)),
        }
    }
}

impl<St: Clone, P: PushProvider> Clone for AppState<St, P> {
    fn clone(&self) -> Self {
        Self {
            targets: self.targets.clone(),
            notifier: Arc::clone(&self.notifier),
            provisioner: Arc::clone(&self.provisioner),
        }
    }
}

/// Create the relay router.
pub fn router<St, P>(state: AppState<St, P>) -> Router
where
    St: Storage + Clone + Send + Sync + 'static,
    P: PushProvider + 'static,
{
    Router::new()
        .route(
            "/register/device/{user_id}",
            post(register::register_device::<St, P>).delete(register::delete_device::<St, P>),
        )
        .route("/notify/device/{device_id}", post(notify::notify_device::<St, P>))
        .route("/notify/user/{user_id}", post(notify::notify_user::<St, P>))
        .route("/notify/topic/{topic}", post(notify::notify_topic::<St, P>))
        .route(
            "/topics/{user_id}",
            get(topics::list_topics::<St, P>)
                .post(topics::add_topics::<St, P>)
                .delete(topics::remove_topics::<St, P>),
        )
        .route("/topics", delete(topics::remove_topics_everywhere::<St, P>))
        .route(
            "/admin/push/{app_id}",
            get(admin::push_status::<St, P>)
                .post(admin::set_push_credential::<St, P>)
                .delete(admin::unset_push_credential::<St, P>),
        )
        .with_state(state)
}

/// Tenant id from the `X-App-Id` header, if present and readable.
fn app_id_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get("X-App-Id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Parse an optional JSON body; an empty body is `None`.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<Option<T>, serde_json::Error> {
    if body.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(body).map(Some)
}
