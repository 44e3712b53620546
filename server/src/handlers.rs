//! HTTP route handlers: health check, webhook ingress, and the JSON API
//! (`spec.md` §4.5).

use std::collections::HashMap;

use axum::body::{to_bytes, Body};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::Router;
use chrono::Utc;
use hookshot_core::{StoredRequest, StoredResponse};
use hookshot_protocol::HttpRequest;
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::options::WEBHOOK_DEADLINE;
use crate::state::{short_request_id, AppState};
use crate::websocket::run_tunnel_connection;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health))
        .route("/ws", axum::routing::get(ws_upgrade))
        .route("/t/{tunnel_id}", axum::routing::any(webhook_root))
        .route("/t/{tunnel_id}/{*rest}", axum::routing::any(webhook_rest))
        .route(
            "/api/tunnels/{tunnel_id}/requests",
            axum::routing::get(list_requests),
        )
        .route(
            "/api/tunnels/{tunnel_id}/requests/{request_id}/replay",
            axum::routing::post(replay),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    if let Some(origin) = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok()) {
        let origins = &state.options.allowed_origins;
        if !origin.is_empty() && !origins.is_empty() && !origins.iter().any(|o| o == origin) {
            return (StatusCode::FORBIDDEN, "origin not allowed").into_response();
        }
    }

    ws.max_message_size(state.options.max_message_size)
        .on_upgrade(move |socket| run_tunnel_connection(socket, state))
}

async fn webhook_root(
    State(state): State<AppState>,
    Path(tunnel_id): Path<String>,
    request: axum::extract::Request<Body>,
) -> Response {
    handle_webhook(state, tunnel_id, String::new(), request).await
}

async fn webhook_rest(
    State(state): State<AppState>,
    Path((tunnel_id, rest)): Path<(String, String)>,
    request: axum::extract::Request<Body>,
) -> Response {
    handle_webhook(state, tunnel_id, rest, request).await
}

async fn handle_webhook(
    state: AppState,
    tunnel_id: String,
    rest: String,
    request: axum::extract::Request<Body>,
) -> Response {
    let Some(tunnel) = state.registry.get(&tunnel_id).await else {
        return (StatusCode::NOT_FOUND, "tunnel not found").into_response();
    };

    let method = request.method().clone();
    let query = request.uri().query().map(|q| q.to_string());
    let headers = single_valued_headers(request.headers());

    let body = match to_bytes(request.into_body(), state.options.max_body_size).await {
        Ok(bytes) => bytes.to_vec(),
        Err(_) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, "request body exceeds the configured limit")
                .into_response()
        }
    };

    let mut path = format!("/{rest}");
    if let Some(query) = query {
        path.push('?');
        path.push_str(&query);
    }

    let request_id = short_request_id();
    let timestamp = Utc::now();

    state.registry.store.store(
        &tunnel_id,
        StoredRequest {
            id: request_id.clone(),
            tunnel_id: tunnel_id.clone(),
            method: method.to_string(),
            path: path.clone(),
            headers: headers.clone(),
            body: body.clone(),
            timestamp,
        },
    );

    let http_request = HttpRequest {
        id: request_id.clone(),
        tunnel_id: tunnel_id.clone(),
        method: method.to_string(),
        path,
        headers,
        body,
        timestamp,
    };

    match tunnel.forward_request(http_request, WEBHOOK_DEADLINE).await {
        Ok(response) => {
            state.registry.store.store_response(StoredResponse {
                request_id: response.request_id.clone(),
                status_code: response.status_code,
                headers: response.headers.clone(),
                body: response.body.clone(),
            });
            build_response(response)
        }
        Err(err) => {
            let message = format!("upstream forward failed for request {request_id}: {err}");
            (StatusCode::BAD_GATEWAY, message).into_response()
        }
    }
}

fn build_response(response: hookshot_protocol::HttpResponse) -> Response {
    let mut builder = Response::builder().status(response.status_code);
    for (name, value) in &response.headers {
        builder = builder.header(name, value);
    }
    builder
        .body(Body::from(response.body))
        .unwrap_or_else(|_| (StatusCode::INTERNAL_SERVER_ERROR, "invalid upstream response headers").into_response())
}

/// First value wins for duplicate header names on ingress (`spec.md` §3).
fn single_valued_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (name, value) in headers.iter() {
        if let Ok(value) = value.to_str() {
            map.entry(name.to_string()).or_insert_with(|| value.to_string());
        }
    }
    map
}

#[derive(Serialize)]
struct RequestSummaryDto {
    id: String,
    method: String,
    path: String,
    timestamp: String,
    status_code: Option<u16>,
}

async fn list_requests(
    State(state): State<AppState>,
    Path(tunnel_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_bearer(&state, &headers) {
        return response;
    }

    let summaries = state
        .registry
        .store
        .list(&tunnel_id)
        .into_iter()
        .map(|s| RequestSummaryDto {
            id: s.id,
            method: s.method,
            path: s.path,
            timestamp: s.timestamp.to_rfc3339(),
            status_code: s.status_code,
        })
        .collect::<Vec<_>>();

    Json(summaries).into_response()
}

#[derive(Serialize)]
struct ReplayResultDto {
    request_id: String,
    status_code: u16,
    headers: HashMap<String, String>,
    body_length: usize,
}

async fn replay(
    State(state): State<AppState>,
    Path((tunnel_id, request_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_bearer(&state, &headers) {
        return response;
    }

    let Some(stored) = state.registry.store.get(&request_id) else {
        return (StatusCode::NOT_FOUND, "request not found").into_response();
    };
    if stored.tunnel_id != tunnel_id {
        return (StatusCode::NOT_FOUND, "request does not belong to this tunnel").into_response();
    }
    let Some(tunnel) = state.registry.get(&tunnel_id).await else {
        return (StatusCode::NOT_FOUND, "tunnel not found").into_response();
    };

    let new_id = short_request_id();
    let timestamp = Utc::now();

    state.registry.store.store(
        &tunnel_id,
        StoredRequest {
            id: new_id.clone(),
            tunnel_id: tunnel_id.clone(),
            method: stored.method.clone(),
            path: stored.path.clone(),
            headers: stored.headers.clone(),
            body: stored.body.clone(),
            timestamp,
        },
    );

    let http_request = HttpRequest {
        id: new_id.clone(),
        tunnel_id: tunnel_id.clone(),
        method: stored.method.clone(),
        path: stored.path.clone(),
        headers: stored.headers.clone(),
        body: stored.body.clone(),
        timestamp,
    };

    match tunnel.forward_request(http_request, WEBHOOK_DEADLINE).await {
        Ok(response) => {
            state.registry.store.store_response(StoredResponse {
                request_id: response.request_id.clone(),
                status_code: response.status_code,
                headers: response.headers.clone(),
                body: response.body.clone(),
            });
            Json(ReplayResultDto {
                request_id: new_id,
                status_code: response.status_code,
                body_length: response.body.len(),
                headers: response.headers,
            })
            .into_response()
        }
        Err(err) => {
            let message = format!("replay failed for request {new_id}: {err}");
            (StatusCode::BAD_GATEWAY, message).into_response()
        }
    }
}

/// `/api/*` is bearer-only; a `?token=` query string is never accepted
/// (`spec.md` §4.5 "Auth").
fn require_bearer(state: &AppState, headers: &HeaderMap) -> Result<(), Response> {
    let Some(expected) = &state.options.token else {
        return Ok(());
    };
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if provided == Some(expected.as_str()) {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "missing or invalid bearer token").into_response())
    }
}
