use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    metrics::metrics_middleware,
    security_headers::security_headers_middleware,
    tracing::{make_request_span, request_id_middleware},
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::ServerSettings;
use crate::handlers::{
    analyze::analyze_handler,
    app::{health_check, index},
    metrics::metrics,
};
use crate::AppState;

pub fn build_router(state: AppState, server: &ServerSettings) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/analyze", post(analyze_handler))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .nest_service("/static", ServeDir::new(&server.static_dir))
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
        // Outermost, so the span above sees the id
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
