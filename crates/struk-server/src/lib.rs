//! Struk Web Server
//!
//! Axum-based REST API for the Struk receipt tracker: receipt upload and
//! lookup, spending summaries, and a JSON chat webhook.
//!
//! Security features:
//! - API key authentication (secure by default, use --no-auth for local dev)
//! - Restrictive CORS policy
//! - Input validation (pagination limits, upload size and type limits)
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use struk_core::ai::{AIBackend, AIClient};
use struk_core::{ChatBot, Config, Database, ReceiptExtractor, ReceiptIngestor, SummaryEngine};

mod handlers;

/// Maximum receipt image size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Maximum request body size; leaves room for multipart framing and base64
pub const MAX_BODY_SIZE: usize = 16 * 1024 * 1024;

/// Authorization header for API key auth
const AUTHORIZATION_HEADER: &str = "authorization";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether authentication is required (secure by default)
    pub require_auth: bool,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// API keys accepted as `Authorization: Bearer <key>`
    pub api_keys: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
            api_keys: vec![],
        }
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    /// Week start, extraction timeout
    pub settings: Config,
    /// `None` when no AI backend is configured; uploads are then refused
    pub ingestor: Option<ReceiptIngestor>,
    pub chat: ChatBot,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig, settings: Config, ai: Option<AIClient>) -> Self {
        let ingestor = ai.map(|ai| {
            let extractor = ReceiptExtractor::new(ai, settings.extraction_timeout);
            ReceiptIngestor::new(extractor, Arc::new(db.clone()))
        });

        let mut chat = ChatBot::new(Arc::new(db.clone()), settings.week_start);
        if let Some(ref ingestor) = ingestor {
            chat = chat.with_ingestor(ingestor.clone());
        }

        Self {
            db,
            config,
            settings,
            ingestor,
            chat,
        }
    }

    /// Aggregation engine over the shared database
    pub fn summaries(&self) -> SummaryEngine<'_> {
        SummaryEngine::new(&self.db, self.settings.week_start)
    }
}

/// Authentication middleware - validates API keys
///
/// API keys are compared in constant time to prevent timing attacks.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.require_auth {
        return next.run(request).await;
    }

    let api_key_valid = request
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|key| validate_api_key(key, &state.config.api_keys))
        .unwrap_or(false);

    if api_key_valid {
        info!(user = "api-key", path = %request.uri().path(), "Authenticated via API key");
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "Unauthorized request - no valid auth");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

/// Validate an API key against the configured keys using constant-time comparison
fn validate_api_key(provided: &str, valid_keys: &[String]) -> bool {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();

    for key in valid_keys {
        let key_bytes = key.as_bytes();
        // Only compare if lengths match (constant-time for same-length keys)
        if provided_bytes.len() == key_bytes.len() && provided_bytes.ct_eq(key_bytes).into() {
            return true;
        }
    }
    false
}

/// Parse a comma-separated list (API keys, CORS origins), ignoring blanks
pub fn parse_comma_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Create the application router with the AI backend from the environment
pub fn create_router(db: Database, config: ServerConfig, settings: Config) -> Router {
    let ai = AIClient::from_env();
    match ai {
        Some(ref client) => info!(
            "AI backend configured: {} (model: {})",
            client.host(),
            client.model()
        ),
        None => warn!("⚠️  AI backend not configured (set OLLAMA_HOST to enable receipt analysis)"),
    }
    create_router_with_ai(db, config, settings, ai)
}

/// Create the application router with an explicit AI backend (for testing)
pub fn create_router_with_ai(
    db: Database,
    config: ServerConfig,
    settings: Config,
    ai: Option<AIClient>,
) -> Router {
    let state = Arc::new(AppState::new(db, config.clone(), settings, ai));

    let protected = Router::new()
        .route("/upload", post(handlers::upload_receipt))
        .route("/receipts/:user_id", get(handlers::list_receipts))
        .route(
            "/receipts/:user_id/:receipt_id",
            get(handlers::get_receipt).delete(handlers::delete_receipt),
        )
        .route("/summary/:user_id", get(handlers::daily_summary))
        .route("/weekly/:user_id", get(handlers::weekly_summary))
        .route("/monthly/:user_id", get(handlers::monthly_summary))
        .route("/stats/:user_id", get(handlers::stats))
        .route("/categories/:user_id", get(handlers::categories))
        .route("/chat/messages", post(handlers::chat_message))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let cors_methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods(cors_methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(cors_methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    Router::new()
        .route("/", get(handlers::health))
        .merge(protected)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
        ))
}

/// Start the server
pub async fn serve(db: Database, host: &str, port: u16, settings: Config) -> anyhow::Result<()> {
    serve_with_config(db, host, port, ServerConfig::default(), settings).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    config: ServerConfig,
    settings: Config,
) -> anyhow::Result<()> {
    if !config.require_auth {
        warn!("⚠️  Authentication disabled - do not expose to network!");
    } else if config.api_keys.is_empty() {
        warn!("⚠️  Authentication enabled but no API keys configured - all protected routes will return 401");
    }

    check_ai_connection().await;

    let app = create_router(db, config, settings);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log AI backend connection status
async fn check_ai_connection() {
    match AIClient::from_env() {
        Some(client) => {
            if client.health_check().await {
                info!(
                    "✅ AI backend connected: {} (model: {})",
                    client.host(),
                    client.model()
                );
            } else {
                warn!(
                    "⚠️  AI backend configured but not responding: {} (model: {})",
                    client.host(),
                    client.model()
                );
            }
        }
        None => {
            info!("ℹ️  AI backend not configured (set OLLAMA_HOST to enable receipt analysis)");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Message returned for any model-side failure
const ANALYSIS_FAILED_MESSAGE: &str = "could not analyze image";

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn unavailable(msg: &str) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, status = %self.status, "Request failed");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        use struk_core::Error as CoreError;

        let err = err.into();
        let (status, message) = match err.downcast_ref::<CoreError>() {
            Some(CoreError::InvalidRequest(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            Some(CoreError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg.clone()),
            Some(e) if e.is_extraction_error() => {
                (StatusCode::BAD_GATEWAY, ANALYSIS_FAILED_MESSAGE.to_string())
            }
            // Return generic message to client
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal error occurred".to_string(),
            ),
        };

        Self {
            status,
            message,
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
