pub mod config;
pub mod logging;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::llm_provider::{build_gateway, LlmGateway};
use crate::state::AppState;

/// Builds the gateway from `config` and wires the full application.
///
/// A gateway that fails to initialize is logged and left out; the service
/// still starts and LLM-backed routes answer 503.
pub fn create_app(config: &Config) -> axum::Router {
    let gateway = match build_gateway(&config.llm) {
        Ok(gateway) => Some(gateway),
        Err(err) => {
            tracing::error!(error = %err, "Failed to initialize AI assistant");
            None
        }
    };

    app_with_gateway(gateway, &config.cors_origins)
}

pub fn app_with_gateway(
    gateway: Option<Arc<dyn LlmGateway>>,
    cors_origins: &[String],
) -> axum::Router {
    routes::router(AppState::new(gateway))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
}

pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .allow_credentials(true)
}
