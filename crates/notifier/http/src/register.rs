//! Device registration handlers.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;

use notifier_core::{ErrorEntry, ErrorEnvelope, codes};
use notifier_push::PushProvider;
use notifier_service::DeviceRegistration;
use notifier_storage::Storage;

use crate::{AppState, app_id_header, envelope_response, parse_body, storage_error_response};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterDeviceBody {
    pub device_id: Option<String>,
    pub token: Option<String>,
    pub model: Option<String>,
    pub platform: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteDeviceBody {
    pub device_id: Option<String>,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

fn validate(
    app_id: &Option<String>,
    user_id: &str,
    missing_params: Vec<&'static str>,
) -> ErrorEnvelope {
    let mut envelope = ErrorEnvelope::new();
    if !present(app_id) {
        envelope.push(codes::APP_ID_REQUIRED);
    }
    if user_id.is_empty() {
        envelope.push(codes::USER_ID_REQUIRED);
    }
    if !missing_params.is_empty() {
        envelope.push(
            ErrorEntry::new(codes::BODY_PARAMS_MISSING).with_meta(json!({"params": missing_params})),
        );
    }
    envelope
}

pub async fn register_device<St, P>(
    State(state): State<AppState<St, P>>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    St: Storage + Clone + Send + Sync + 'static,
    P: PushProvider,
{
    let app_id = app_id_header(&headers);
    let body: RegisterDeviceBody = match parse_body(&body) {
        Ok(parsed) => parsed.unwrap_or_default(),
        Err(e) => return crate::malformed_body_response(&e),
    };

    let mut missing = Vec::new();
    for (name, value) in [
        ("deviceId", &body.device_id),
        ("token", &body.token),
        ("model", &body.model),
        ("platform", &body.platform),
    ] {
        if !present(value) {
            missing.push(name);
        }
    }

    let envelope = validate(&app_id, &user_id, missing);
    if !envelope.is_empty() {
        return envelope_response(StatusCode::BAD_REQUEST, envelope);
    }

    // Validation guarantees presence of every field below.
    let registration = DeviceRegistration {
        device_id: body.device_id.unwrap_or_default(),
        token: body.token.unwrap_or_default(),
        model: body.model.unwrap_or_default(),
        platform: body.platform.unwrap_or_default(),
    };
    let app_id = app_id.unwrap_or_default();

    match state
        .targets
        .upsert_device(&user_id, &app_id, registration)
        .await
    {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "device registration failed");
            storage_error_response(&e)
        }
    }
}

pub async fn delete_device<St, P>(
    State(state): State<AppState<St, P>>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    St: Storage + Clone + Send + Sync + 'static,
    P: PushProvider,
{
    let app_id = app_id_header(&headers);
    let body: DeleteDeviceBody = match parse_body(&body) {
        Ok(parsed) => parsed.unwrap_or_default(),
        Err(e) => return crate::malformed_body_response(&e),
    };

    let mut missing = Vec::new();
    if !present(&body.device_id) {
        missing.push("deviceId");
    }

    let envelope = validate(&app_id, &user_id, missing);
    if !envelope.is_empty() {
        return envelope_response(StatusCode::BAD_REQUEST, envelope);
    }

    let app_id = app_id.unwrap_or_default();
    let device_id = body.device_id.unwrap_or_default();

    match state
        .targets
        .delete_device(&user_id, &app_id, &device_id)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "device deletion failed");
            storage_error_response(&e)
        }
    }
}
