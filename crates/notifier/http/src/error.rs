//! Service error to wire-shape mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use notifier_core::{ErrorEntry, ErrorEnvelope, codes};
use notifier_service::NotifyError;
use notifier_storage::StoreError;

/// Render an envelope at the given status.
pub fn envelope_response(status: StatusCode, envelope: ErrorEnvelope) -> Response {
    (status, Json(envelope)).into_response()
}

/// A store failure surfaces its diagnostic message as detail.
pub fn storage_error_response(err: &StoreError) -> Response {
    envelope_response(
        StatusCode::BAD_REQUEST,
        ErrorEnvelope::single(
            ErrorEntry::new(codes::STORAGE_FAILED).with_meta(json!({"details": err.message()})),
        ),
    )
}

/// A body that was present but not valid JSON.
pub fn malformed_body_response(err: &serde_json::Error) -> Response {
    envelope_response(
        StatusCode::BAD_REQUEST,
        ErrorEnvelope::single(
            ErrorEntry::new(codes::BODY_PARAMS_MISSING)
                .with_meta(json!({"details": err.to_string()})),
        ),
    )
}

/// Map a resolver failure onto its status and envelope.
pub fn notify_error_response(err: NotifyError) -> Response {
    match err {
        NotifyError::Invalid(envelope) => envelope_response(StatusCode::BAD_REQUEST, envelope),
        NotifyError::DeviceNotFound { device_id, app_id } => envelope_response(
            StatusCode::NOT_FOUND,
            ErrorEnvelope::single(ErrorEntry::new(codes::DEVICE_NOT_FOUND).with_meta(json!({
                "details": format!("deviceId {device_id} not found in {app_id}"),
            }))),
        ),
        NotifyError::UserNotFound { user_id, app_id } => envelope_response(
            StatusCode::NOT_FOUND,
            ErrorEnvelope::single(ErrorEntry::new(codes::USER_NOT_FOUND).with_meta(json!({
                "details": format!("{user_id} in {app_id} not found"),
            }))),
        ),
        NotifyError::Store(err) => storage_error_response(&err),
        NotifyError::Send(err) => envelope_response(
            StatusCode::BAD_REQUEST,
            ErrorEnvelope::single(
                ErrorEntry::new(codes::PUSH_SEND_FAILED)
                    .with_meta(json!({"details": err.to_string()})),
            ),
        ),
    }
}
