//! HTTP bridge exposing a turn as a Server-Sent Events stream.

use axum::{
    body::Body,
    extract::{Query, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self as axum_mw, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{info, warn};

use crate::agent::{Agent, TurnHandle};
use crate::core::config::AppConfig;
use crate::core::error::SkillsError;
use crate::stream::to_sse_frame;


/// Shared state behind every route.
pub struct WebState {
    pub agent: Agent,
    pub credentials_configured: bool,
    pub cors_origins: Vec<String>,
}

impl WebState {
    pub fn new(agent: Agent) -> Self {
        let config = agent.config();
        Self {
            credentials_configured: config.has_credentials(),
            cors_origins: config.web.cors_origins.clone(),
            agent,
        }
    }

    fn allows_origin(&self, origin: &str) -> bool {
        self.cors_origins.iter().any(|o| o == "*" || o == origin)
    }
}

pub fn router(state: Arc<WebState>) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/skills", get(skills_handler))
        .route("/api/prompt", get(prompt_handler))
        .route("/api/chat/stream", get(chat_stream_handler))
        .layer(axum_mw::from_fn_with_state(state.clone(), cors_middleware))
        .with_state(state)
}

/// Bind the configured address and serve until the process stops.
pub async fn serve(agent: Agent, config: &AppConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.web.host, config.web.port);
    let app = router(Arc::new(WebState::new(agent)));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "web bridge listening");
    eprintln!("Serving on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_handler(State(state): State<Arc<WebState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "api_credentials_configured": state.credentials_configured,
    }))
}

async fn skills_handler(State(state): State<Arc<WebState>>) -> impl IntoResponse {
    let skills: Vec<_> = state
        .agent
        .get_discovered_skills()
        .into_iter()
        .map(|s| {
            json!({
                "name": s.name,
                "description": s.description,
                "path": s.skill_path.display().to_string(),
            })
        })
        .collect();
    Json(json!({ "skills": skills }))
}

async fn prompt_handler(State(state): State<Arc<WebState>>) -> impl IntoResponse {
    Json(json!({ "prompt": state.agent.get_system_prompt() }))
}

#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_thread_id")]
    pub thread_id: String,
}

fn default_thread_id() -> String {
    "default".to_string()
}

async fn chat_stream_handler(
    State(state): State<Arc<WebState>>,
    Query(query): Query<ChatQuery>,
) -> Response {
    let message = query.message.trim().to_string();
    if message.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Message cannot be empty" })),
        )
            .into_response();
    }

    info!(thread_id = %query.thread_id, "chat stream started");
    let handle = state.agent.run(message, &query.thread_id);

    let frames = turn_frames(handle);

    let mut resp = Response::new(Body::from_stream(frames));
    let headers = resp.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    resp
}

/// SSE frames for one turn. Dropping the stream, polled or not, cancels
/// the turn.
pub(crate) fn turn_frames(
    handle: TurnHandle,
) -> impl futures_core::Stream<Item = Result<String, Infallible>> + Send + 'static {
    let TurnHandle {
        mut events,
        cancel,
        task,
    } = handle;
    let guard = cancel.drop_guard();

    async_stream::stream! {
        let _guard = guard;
        let mut error_sent = false;

        while let Some(event) = events.recv().await {
            error_sent |= event.is_error();
            yield Ok::<String, Infallible>(event.to_sse_frame());
        }

        let failure = match task.await {
            Ok(Ok(_)) | Ok(Err(SkillsError::Cancelled)) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(e) => Some(format!("agent task failed: {e}")),
        };
        if let Some(message) = failure {
            warn!(error = %message, "chat stream failed");
            if !error_sent {
                yield Ok(to_sse_frame("error", &json!({ "type": "error", "message": message })));
            }
        }
    }
}

/// Echo allow-listed origins and answer preflight requests directly.
async fn cors_middleware(
    State(state): State<Arc<WebState>>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .filter(|o| state.allows_origin(o))
        .map(str::to_string);

    let mut resp = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    if let Some(origin) = origin {
        let headers = resp.headers_mut();
        if let Ok(value) = HeaderValue::from_str(&origin) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("*"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("*"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
    }
    resp
}
