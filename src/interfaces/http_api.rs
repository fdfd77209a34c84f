use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::application::{MutationError, MutationGateway};
use crate::domain::{now_epoch, CooldownPolicy, Region, TenantId, Uid};

/// The command surface consumed by the external presentation layer (the
/// chat bot). Thin: parse, call the gateway, render a status code.
#[derive(Clone)]
pub struct ApiState {
    pub gateway: Arc<MutationGateway>,
    pub policy: CooldownPolicy,
    pub api_token: Option<String>,
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tenants/{id}", get(tenant_state))
        .route(
            "/tenants/{id}/entries",
            get(list_entries).post(add_entry).delete(remove_entry),
        )
        .route("/tenants/{id}/clear", post(clear_entries))
        .route("/tenants/{id}/notify-channel", put(set_notify_channel))
        .route("/tenants/{id}/allowed-channels", put(set_allowed_channels))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn tenant_state(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err((code, msg)) = check_auth(&headers, &state.api_token) {
        return (code, msg).into_response();
    }
    match state.gateway.tenant_state(&TenantId::new(id)).await {
        Ok(Some(tenant)) => Json(tenant).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "unknown tenant".to_string()).into_response(),
        Err(e) => mutation_error_response(e),
    }
}

#[derive(Serialize)]
struct EntryView {
    uid: String,
    server: String,
    last_liked_at: Option<i64>,
    due: bool,
    seconds_until_due: u64,
}

async fn list_entries(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err((code, msg)) = check_auth(&headers, &state.api_token) {
        return (code, msg).into_response();
    }
    match state.gateway.list(&TenantId::new(id)).await {
        Ok(entries) => {
            let now = now_epoch();
            let view: Vec<EntryView> = entries
                .into_iter()
                .map(|e| EntryView {
                    due: state.policy.is_due(&e, now),
                    seconds_until_due: state.policy.time_remaining(&e, now),
                    uid: e.uid,
                    server: e.region,
                    last_liked_at: e.last_liked_at,
                })
                .collect();
            Json(view).into_response()
        }
        Err(e) => mutation_error_response(e),
    }
}

#[derive(Deserialize)]
struct EntryBody {
    uid: String,
    server: String,
    requester: Option<String>,
}

async fn add_entry(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<EntryBody>,
) -> impl IntoResponse {
    if let Err((code, msg)) = check_auth(&headers, &state.api_token) {
        return (code, msg).into_response();
    }

    let (uid, region) = match parse_entry_key(&body.uid, &body.server) {
        Ok(parsed) => parsed,
        Err(msg) => return (StatusCode::BAD_REQUEST, msg).into_response(),
    };

    match state
        .gateway
        .add(&TenantId::new(id), &region, &uid, body.requester.as_deref())
        .await
    {
        Ok(()) => (StatusCode::CREATED, "added".to_string()).into_response(),
        Err(e) => mutation_error_response(e),
    }
}

async fn remove_entry(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<EntryBody>,
) -> impl IntoResponse {
    if let Err((code, msg)) = check_auth(&headers, &state.api_token) {
        return (code, msg).into_response();
    }

    let (uid, region) = match parse_entry_key(&body.uid, &body.server) {
        Ok(parsed) => parsed,
        Err(msg) => return (StatusCode::BAD_REQUEST, msg).into_response(),
    };

    match state.gateway.remove(&TenantId::new(id), &region, &uid).await {
        Ok(()) => (StatusCode::OK, "removed".to_string()).into_response(),
        Err(e) => mutation_error_response(e),
    }
}

async fn clear_entries(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err((code, msg)) = check_auth(&headers, &state.api_token) {
        return (code, msg).into_response();
    }
    match state.gateway.clear(&TenantId::new(id)).await {
        Ok(()) => (StatusCode::OK, "cleared".to_string()).into_response(),
        Err(e) => mutation_error_response(e),
    }
}

#[derive(Deserialize)]
struct ChannelBody {
    channel: u64,
}

async fn set_notify_channel(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<ChannelBody>,
) -> impl IntoResponse {
    if let Err((code, msg)) = check_auth(&headers, &state.api_token) {
        return (code, msg).into_response();
    }
    match state
        .gateway
        .set_notify_channel(&TenantId::new(id), body.channel)
        .await
    {
        Ok(()) => (StatusCode::OK, "set".to_string()).into_response(),
        Err(e) => mutation_error_response(e),
    }
}

#[derive(Deserialize)]
struct ChannelsBody {
    channels: Vec<u64>,
}

async fn set_allowed_channels(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<ChannelsBody>,
) -> impl IntoResponse {
    if let Err((code, msg)) = check_auth(&headers, &state.api_token) {
        return (code, msg).into_response();
    }
    match state
        .gateway
        .set_allowed_channels(&TenantId::new(id), body.channels)
        .await
    {
        Ok(()) => (StatusCode::OK, "set".to_string()).into_response(),
        Err(e) => mutation_error_response(e),
    }
}

fn parse_entry_key(uid: &str, server: &str) -> Result<(Uid, Region), String> {
    let uid = Uid::parse(uid).map_err(|e| e.to_string())?;
    let region = Region::parse(server).map_err(|e| e.to_string())?;
    Ok((uid, region))
}

fn mutation_error_response(e: MutationError) -> axum::response::Response {
    let code = match &e {
        MutationError::AlreadyExists { .. } => StatusCode::CONFLICT,
        MutationError::NotFound { .. } => StatusCode::NOT_FOUND,
        MutationError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (code, e.to_string()).into_response()
}

fn check_auth(headers: &HeaderMap, token: &Option<String>) -> Result<(), (StatusCode, String)> {
    let Some(expected) = token else {
        return Ok(());
    }; // no token configured, auth disabled
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if auth == format!("Bearer {}", expected) {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "unauthorized".to_string()))
    }
}
