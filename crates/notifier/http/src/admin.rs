//! Tenant provisioning handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use notifier_core::{ErrorEntry, ErrorEnvelope, codes};
use notifier_push::PushProvider;
use notifier_service::ProvisionFailure;
use notifier_storage::Storage;

use crate::{AppState, envelope_response, storage_error_response};

pub async fn push_status<St, P>(
    State(state): State<AppState<St, P>>,
    Path(app_id): Path<String>,
) -> Response
where
    St: Storage + Clone + Send + Sync + 'static,
    P: PushProvider,
{
    match state.provisioner.status(&app_id).await {
        Ok(status) => (
            StatusCode::OK,
            Json(json!({"appId": app_id, "push": status.live, "stored": status.stored})),
        )
            .into_response(),
        Err(e) => storage_error_response(&e),
    }
}

pub async fn set_push_credential<St, P>(
    State(state): State<AppState<St, P>>,
    Path(app_id): Path<String>,
    body: Bytes,
) -> Response
where
    St: Storage + Clone + Send + Sync + 'static,
    P: PushProvider,
{
    if body.is_empty() {
        return envelope_response(
            StatusCode::BAD_REQUEST,
            ErrorEnvelope::single(codes::PUSH_CREDENTIAL_INVALID),
        );
    }

    match state.provisioner.provision(&app_id, &body).await {
        Ok(()) => (StatusCode::OK, Json(json!({"appId": app_id, "push": true}))).into_response(),
        Err(ProvisionFailure::Init(e)) => {
            tracing::error!(app_id = %app_id, error = %e, "push client initialization failed");
            envelope_response(
                StatusCode::BAD_REQUEST,
                ErrorEnvelope::single(
                    ErrorEntry::new(codes::PUSH_INIT_FAILED)
                        .with_meta(json!({"details": e.to_string()})),
                ),
            )
        }
        Err(ProvisionFailure::Store(e)) => storage_error_response(&e),
    }
}

pub async fn unset_push_credential<St, P>(
    State(state): State<AppState<St, P>>,
    Path(app_id): Path<String>,
) -> Response
where
    St: Storage + Clone + Send + Sync + 'static,
    P: PushProvider,
{
    match state.provisioner.unprovision(&app_id).await {
        Ok(()) => (StatusCode::OK, Json(json!({"appId": app_id, "push": false}))).into_response(),
        Err(e) => storage_error_response(&e),
    }
}
