//! HTTP API Layer
//!
//! REST API for the estate levy system using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: payments, previews, bill history, next-due and summaries
//! - **Middleware**: request ids, tracing and audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent `{error, message}` responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(service, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;

use std::sync::Arc;

use axum::{
    Router,
    http::HeaderName,
    routing::{get, post},
    middleware as axum_middleware,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use domain_levy::PaymentService;

use crate::config::ApiConfig;
use crate::handlers::{health, levy};
use crate::middleware::audit_middleware;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PaymentService>,
    pub config: ApiConfig,
}

/// Creates the main API router
///
/// # Arguments
///
/// * `service` - Payment service over the configured levy store
/// * `config` - API configuration
pub fn create_router(service: Arc<PaymentService>, config: ApiConfig) -> Router {
    let state = AppState { service, config };
    let request_id = HeaderName::from_static("x-request-id");

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let payment_routes = Router::new()
        .route("/", post(levy::record_payment))
        .route("/preview", post(levy::preview_payment));

    let resident_routes = Router::new()
        .route("/:id/bills", get(levy::list_bills))
        .route("/:id/next-due", get(levy::next_due));

    let api_routes = Router::new()
        .nest("/payments", payment_routes)
        .nest("/residents", resident_routes)
        .route("/summary", get(levy::collection_summary))
        .layer(axum_middleware::from_fn(audit_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
