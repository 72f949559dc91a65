//! Notification handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use notifier_core::NotifyBody;
use notifier_push::PushProvider;
use notifier_storage::Storage;

use crate::{AppState, app_id_header, malformed_body_response, notify_error_response, parse_body};

pub async fn notify_device<St, P>(
    State(state): State<AppState<St, P>>,
    Path(device_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    St: Storage + Clone + Send + Sync + 'static,
    P: PushProvider,
{
    let body: Option<NotifyBody> = match parse_body(&body) {
        Ok(parsed) => parsed,
        Err(e) => return malformed_body_response(&e),
    };

    match state
        .notifier
        .notify_device(app_id_header(&headers), Some(device_id), body)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => notify_error_response(e),
    }
}

pub async fn notify_user<St, P>(
    State(state): State<AppState<St, P>>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    St: Storage + Clone + Send + Sync + 'static,
    P: PushProvider,
{
    let body: Option<NotifyBody> = match parse_body(&body) {
        Ok(parsed) => parsed,
        Err(e) => return malformed_body_response(&e),
    };

    match state
        .notifier
        .notify_user(app_id_header(&headers), Some(user_id), body)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => notify_error_response(e),
    }
}

pub async fn notify_topic<St, P>(
    State(state): State<AppState<St, P>>,
    Path(topic): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    St: Storage + Clone + Send + Sync + 'static,
    P: PushProvider,
{
    let body: Option<NotifyBody> = match parse_body(&body) {
        Ok(parsed) => parsed,
        Err(e) => return malformed_body_response(&e),
    };

    match state
        .notifier
        .notify_topic(app_id_header(&headers), Some(topic), body)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => notify_error_response(e),
    }
}
