//! Health, readiness and load-test endpoints.

use {
    axum::{
        Json, Router,
        extract::State,
        http::StatusCode,
        response::IntoResponse,
        routing::{get, post},
    },
    pixbot_common::InboundMessage,
    serde_json::{Value, json},
    tokio::sync::mpsc,
    tracing::{debug, warn},
};

#[derive(Clone)]
pub struct AppState {
    pub inbound: mpsc::Sender<InboundMessage>,
}

/// Build the HTTP router (shared between production startup and tests).
pub fn build_app(inbound: mpsc::Sender<InboundMessage>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/loadtest", post(loadtest_handler))
        .with_state(AppState { inbound })
}

async fn root_handler() -> &'static str {
    "Ok"
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "message": "Service is up and running!",
    }))
}

async fn ready_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ready",
        "message": "Service is ready!",
    }))
}

/// Accept a raw Telegram update and queue its message like a polled one.
async fn loadtest_handler(
    State(state): State<AppState>,
    Json(update): Json<Value>,
) -> (StatusCode, &'static str) {
    let Some(raw) = update
        .get("message")
        .or_else(|| update.get("edited_message"))
        .cloned()
    else {
        return (StatusCode::BAD_REQUEST, "No message");
    };

    let msg: InboundMessage = match serde_json::from_value(raw) {
        Ok(msg) => msg,
        Err(e) => {
            warn!(error = %e, "rejected load-test update");
            return (StatusCode::BAD_REQUEST, "No message");
        },
    };

    debug!(chat_id = %msg.chat_id(), "queued load-test message");
    match state.inbound.send(msg).await {
        Ok(()) => (StatusCode::OK, "Ok"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "Shutting down"),
    }
}
