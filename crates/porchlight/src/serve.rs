// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `porchlight serve` command implementation.
//!
//! Exposes the execution pipeline over HTTP: `POST /chat` for turns,
//! `GET /events` for the dashboard's upcoming events, `POST`/`PUT /log`
//! for interaction feedback, and `GET /health`. When API keys are
//! configured, every endpoint except `/health` requires one in the
//! `Porchlight-Api-Key` header.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use porchlight_agent::ExecutionPipeline;
use porchlight_config::PorchlightConfig;
use porchlight_core::{
    AnswerMode, InteractionRecord, InteractionSink, PorchlightError, SourceCitation, SqlExecutor,
    Turn,
};
use porchlight_storage::{SqliteExecutor, SqliteInteractionLog};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::wiring;

/// Shared state for axum request handlers.
#[derive(Clone)]
struct AppState {
    pipeline: Arc<ExecutionPipeline>,
    executor: Arc<SqliteExecutor>,
    interaction_log: Arc<SqliteInteractionLog>,
    api_keys: Arc<Vec<String>>,
}

/// Request body for `POST /chat`.
#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    conversation_history: Vec<Turn>,
}

/// Response body for `POST /chat`.
#[derive(Debug, Serialize)]
struct ChatResponse {
    session_id: String,
    response: String,
    sources: Vec<SourceCitation>,
    mode: AnswerMode,
    log_id: Option<i64>,
}

/// Query parameters for `GET /events`.
#[derive(Debug, Deserialize)]
struct EventsParams {
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    days_ahead: Option<usize>,
}

/// Response body for `GET /events`.
#[derive(Debug, Serialize)]
struct EventsResponse {
    events: Vec<serde_json::Value>,
    total: usize,
}

/// Request body for `POST /log`.
#[derive(Debug, Deserialize)]
struct LogCreateRequest {
    client_query: String,
    #[serde(default)]
    app_response: String,
    #[serde(default)]
    mode: String,
    #[serde(default)]
    session_id: Option<String>,
}

/// Request body for `PUT /log`.
#[derive(Debug, Deserialize)]
struct LogRateRequest {
    log_id: i64,
    client_response_rating: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Runs the `porchlight serve` command.
pub async fn run_serve(config: PorchlightConfig) -> Result<(), PorchlightError> {
    init_tracing(&config.agent.log_level);
    info!("starting porchlight serve");

    let components = wiring::build(&config, false).await?;
    let state = AppState {
        pipeline: components.pipeline,
        executor: components.executor,
        interaction_log: components.interaction_log,
        api_keys: Arc::new(config.server.api_keys.clone()),
    };

    let app = Router::new()
        .route("/chat", post(post_chat))
        .route("/events", get(get_events))
        .route("/log", post(post_log).put(put_log))
        .route("/health", get(get_health))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener =
        tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| PorchlightError::Config(format!("failed to bind {addr}: {e}")))?;

    info!(
        addr = addr.as_str(),
        auth = !config.server.api_keys.is_empty(),
        "porchlight listening"
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| PorchlightError::Internal(format!("server error: {e}")))?;

    Ok(())
}

/// Checks the API key header when keys are configured.
fn authorize(headers: &HeaderMap, api_keys: &[String]) -> Result<(), Response> {
    if api_keys.is_empty() {
        return Ok(());
    }
    let presented = headers
        .get("Porchlight-Api-Key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if api_keys.iter().any(|key| key == presented) {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Invalid or missing API key".to_string(),
            }),
        )
            .into_response())
    }
}

async fn post_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChatRequest>,
) -> Response {
    if let Err(rejection) = authorize(&headers, &state.api_keys) {
        return rejection;
    }

    if body.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Message is required".to_string(),
            }),
        )
            .into_response();
    }

    let session_id = body
        .session_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let envelope = match state
        .pipeline
        .handle_turn(&session_id, &body.message, &body.conversation_history)
        .await
    {
        Ok(envelope) => envelope,
        Err(e) => {
            // Model contract violations and rejected drafts are internal
            // failures; the reply never carries their detail.
            error!(error = %e, "turn failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Internal server error".to_string(),
                }),
            )
                .into_response();
        }
    };

    // Log synchronously so the client gets a log id for later feedback.
    let record = InteractionRecord {
        session_id: session_id.clone(),
        question: body.message,
        answer: envelope.answer.clone(),
        mode: envelope.mode.to_string(),
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    let log_id = match state.interaction_log.record(&record).await {
        Ok(id) => Some(id),
        Err(e) => {
            error!(error = %e, "interaction log write failed");
            None
        }
    };

    (
        StatusCode::OK,
        Json(ChatResponse {
            session_id,
            response: envelope.answer,
            sources: envelope.sources,
            mode: envelope.mode,
            log_id,
        }),
    )
        .into_response()
}

async fn get_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<EventsParams>,
) -> Response {
    if let Err(rejection) = authorize(&headers, &state.api_keys) {
        return rejection;
    }

    let limit = params.limit.unwrap_or(10).clamp(1, 100);
    let days_ahead = params.days_ahead.unwrap_or(7).clamp(1, 30);

    let sql = format!(
        "SELECT id, event_name, start_date, end_date, start_time, end_time, raw_text, source_pdf \
         FROM weekly_events \
         WHERE start_date >= date('now') \
           AND start_date <= date('now', '+{days_ahead} day') \
         ORDER BY start_date ASC, start_time ASC \
         LIMIT {limit}"
    );

    match state.executor.execute_readonly(&sql, limit).await {
        Ok(output) => {
            let events: Vec<serde_json::Value> = output
                .rows
                .iter()
                .map(|row| {
                    let object: serde_json::Map<String, serde_json::Value> = output
                        .columns
                        .iter()
                        .cloned()
                        .zip(row.iter().cloned())
                        .collect();
                    serde_json::Value::Object(object)
                })
                .collect();
            let total = events.len();
            (StatusCode::OK, Json(EventsResponse { events, total })).into_response()
        }
        Err(e) => {
            error!(error = %e, "events query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch events".to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn post_log(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LogCreateRequest>,
) -> Response {
    if let Err(rejection) = authorize(&headers, &state.api_keys) {
        return rejection;
    }

    if body.client_query.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "client_query is required".to_string(),
            }),
        )
            .into_response();
    }

    let record = InteractionRecord {
        session_id: body.session_id.unwrap_or_default(),
        question: body.client_query,
        answer: body.app_response,
        mode: body.mode,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    match state.interaction_log.record(&record).await {
        Ok(log_id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "log_id": log_id, "message": "Log entry created" })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "log entry creation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create log entry".to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn put_log(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LogRateRequest>,
) -> Response {
    if let Err(rejection) = authorize(&headers, &state.api_keys) {
        return rejection;
    }

    match state
        .interaction_log
        .rate(body.log_id, &body.client_response_rating)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "log_id": body.log_id, "message": "Log entry updated" })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "log entry update failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update log entry".to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn get_health(State(state): State<AppState>) -> Response {
    let database = match state.executor.execute_readonly("SELECT 1", 1).await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };
    let status = if database == "connected" { "ok" } else { "degraded" };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": status,
            "version": env!("CARGO_PKG_VERSION"),
            "database": database,
        })),
    )
        .into_response()
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("porchlight={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
