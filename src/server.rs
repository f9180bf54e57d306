//! Detect proxy: hides the provider credential and forwards base64 images to Gemini.

use crate::ai::gemini::types::GenerateContentRequest;
use crate::ai::gemini::GeminiHttpClient;
use crate::ai::proxy::DETECT_PATH;
use crate::media::{self, MediaType};
use crate::models::{Config, DetectRequest};
use crate::{prompts, Error, Result};
use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

/// MIME type the proxy declares for every forwarded payload.
pub const PROXY_MIME_TYPE: &str = "image/jpeg";

/// Base64 inflates uploads by a third; this leaves room for ~15 MiB files.
pub const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

const NO_IMAGE: &str = "No imageBase64 provided";
const ONLY_POST: &str = "Only POST allowed";
const MISSING_KEY: &str = "GEMINI_API_KEY missing";

/// Shared, read-only state built once at startup.
#[derive(Clone)]
pub struct AppState {
    gemini: Option<GeminiHttpClient>,
    prompt: Arc<str>,
}

impl AppState {
    /// `None` models a deployment without a credential; every detect call then fails with 500.
    pub fn new(gemini: Option<GeminiHttpClient>) -> Self {
        Self {
            gemini,
            prompt: prompts::analysis_prompt(MediaType::Image).into(),
        }
    }

    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        let gemini = config.gemini_api_key.clone().map(|api_key| {
            GeminiHttpClient::new_with_client(
                api_key,
                config.gemini_model.clone(),
                config.request_timeout,
                client,
            )
            .with_base_url(config.gemini_base_url.clone())
        });
        Self::new(gemini)
    }

    pub fn has_credential(&self) -> bool {
        self.gemini.is_some()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(DETECT_PATH, post(detect).fallback(method_not_allowed))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &Config) -> Result<()> {
    let state = AppState::from_config(config, reqwest::Client::new());
    if state.has_credential() {
        info!("Proxy forwarding to model {}", config.gemini_model);
    } else {
        warn!("GEMINI_API_KEY is not set; every detect request will fail with 500");
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Detect proxy listening on http://{}{}", listener.local_addr()?, DETECT_PATH);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Detect proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn detect(State(state): State<Arc<AppState>>, body: Body) -> Result<Response> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("detect", %request_id);
    forward(state, body).instrument(span).await
}

async fn forward(state: Arc<AppState>, body: Body) -> Result<Response> {
    let gemini = state
        .gemini
        .as_ref()
        .ok_or_else(|| Error::Configuration(MISSING_KEY.to_string()))?;

    // Buffered after the credential check.
    let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| Error::Validation(format!("Invalid request body: {}", e)))?;
    let request = decode_body(&body)?;
    let payload = request
        .payload()
        .map(media::strip_data_url_prefix)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| Error::Validation(NO_IMAGE.to_string()))?;

    info!("Forwarding {} base64 chars to Gemini", payload.len());

    let provider_request = GenerateContentRequest::with_inline_media(
        state.prompt.to_string(),
        PROXY_MIME_TYPE.to_string(),
        payload.to_string(),
    );
    let reply = gemini.forward_generate_content(&provider_request).await?;

    let status = if reply.status == StatusCode::OK {
        StatusCode::OK
    } else {
        warn!("Relaying provider status {} as 500", reply.status);
        StatusCode::INTERNAL_SERVER_ERROR
    };

    Ok((status, Json(reply.body)).into_response())
}

fn decode_body(body: &[u8]) -> Result<DetectRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(DetectRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| Error::Validation(format!("Invalid request body: {}", e)))
}

async fn method_not_allowed() -> Error {
    Error::MethodNotAllowed(ONLY_POST.to_string())
}

async fn fallback(method: Method) -> Error {
    if method == Method::POST {
        Error::NotFound("Not found".to_string())
    } else {
        Error::MethodNotAllowed(ONLY_POST.to_string())
    }
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| err.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    Error::Generic(format!("Internal error: {}", detail)).into_response()
}
