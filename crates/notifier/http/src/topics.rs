//! Topic subscription handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;

use notifier_core::{ErrorEntry, ErrorEnvelope, TopicList, codes};
use notifier_push::PushProvider;
use notifier_storage::Storage;

use crate::{
    AppState, app_id_header, envelope_response, malformed_body_response, parse_body,
    storage_error_response,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TopicsBody {
    pub topics: Option<TopicList>,
}

fn validate(app_id: &Option<String>, user_id: Option<&str>) -> ErrorEnvelope {
    let mut envelope = ErrorEnvelope::new();
    if !app_id.as_deref().is_some_and(|v| !v.is_empty()) {
        envelope.push(codes::APP_ID_REQUIRED);
    }
    if user_id.is_some_and(str::is_empty) {
        envelope.push(codes::USER_ID_REQUIRED);
    }
    envelope
}

fn require_topics(body: TopicsBody, envelope: &mut ErrorEnvelope) -> Option<TopicList> {
    match body.topics {
        Some(topics) => Some(topics),
        None => {
            envelope.push(
                ErrorEntry::new(codes::BODY_PARAMS_MISSING)
                    .with_meta(json!({"params": ["topics"]})),
            );
            None
        }
    }
}

pub async fn list_topics<St, P>(
    State(state): State<AppState<St, P>>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    St: Storage + Clone + Send + Sync + 'static,
    P: PushProvider,
{
    let app_id = app_id_header(&headers);
    let envelope = validate(&app_id, Some(&user_id));
    if !envelope.is_empty() {
        return envelope_response(StatusCode::BAD_REQUEST, envelope);
    }
    let app_id = app_id.unwrap_or_default();

    match state.targets.find_topics_by_user(&user_id, &app_id).await {
        Ok(topics) => (StatusCode::OK, Json(topics)).into_response(),
        Err(e) => storage_error_response(&e),
    }
}

pub async fn add_topics<St, P>(
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
    let body: TopicsBody = match parse_body(&body) {
        Ok(parsed) => parsed.unwrap_or_default(),
        Err(e) => return malformed_body_response(&e),
    };

    let mut envelope = validate(&app_id, Some(&user_id));
    let topics = require_topics(body, &mut envelope);
    if !envelope.is_empty() {
        return envelope_response(StatusCode::BAD_REQUEST, envelope);
    }
    let app_id = app_id.unwrap_or_default();
    let topics = topics.unwrap_or_else(|| TopicList::Many(vec![]));

    match state
        .targets
        .add_topics(&user_id, &app_id, topics.clone())
        .await
    {
        Ok(true) => (StatusCode::OK, Json(json!({"topics": topics}))).into_response(),
        Ok(false) => envelope_response(
            StatusCode::NOT_FOUND,
            ErrorEnvelope::single(ErrorEntry::new(codes::USER_NOT_FOUND).with_meta(json!({
                "details": format!("{user_id} in {app_id} not found"),
            }))),
        ),
        Err(e) => storage_error_response(&e),
    }
}

pub async fn remove_topics<St, P>(
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
    let body: TopicsBody = match parse_body(&body) {
        Ok(parsed) => parsed.unwrap_or_default(),
        Err(e) => return malformed_body_response(&e),
    };

    let mut envelope = validate(&app_id, Some(&user_id));
    let topics = require_topics(body, &mut envelope);
    if !envelope.is_empty() {
        return envelope_response(StatusCode::BAD_REQUEST, envelope);
    }
    let app_id = app_id.unwrap_or_default();
    let topics = topics.unwrap_or_else(|| TopicList::Many(vec![]));

    match state
        .targets
        .remove_topics_from_user(&user_id, &app_id, topics.clone())
        .await
    {
        Ok(()) => (StatusCode::OK, Json(json!({"topics": topics}))).into_response(),
        Err(e) => storage_error_response(&e),
    }
}

pub async fn remove_topics_everywhere<St, P>(
    State(state): State<AppState<St, P>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    St: Storage + Clone + Send + Sync + 'static,
    P: PushProvider,
{
    let app_id = app_id_header(&headers);
    let body: TopicsBody = match parse_body(&body) {
        Ok(parsed) => parsed.unwrap_or_default(),
        Err(e) => return malformed_body_response(&e),
    };

    let mut envelope = validate(&app_id, None);
    let topics = require_topics(body, &mut envelope);
    if !envelope.is_empty() {
        return envelope_response(StatusCode::BAD_REQUEST, envelope);
    }
    let app_id = app_id.unwrap_or_default();
    let topics = topics.unwrap_or_else(|| TopicList::Many(vec![]));

    match state
        .targets
        .remove_topics_from_all_users(&app_id, topics.clone())
        .await
    {
        Ok(()) => (StatusCode::OK, Json(json!({"topics": topics}))).into_response(),
        Err(e) => storage_error_response(&e),
    }
}
