use std::time::SystemTime;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::state::AppState;

const SERVICE_NAME: &str = "Pro-English-Writing-Coach API";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(status))
        .route("/live", get(live))
        .route("/info", get(info))
}

#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthStatusResponse {
    status: &'static str,
    gateway_ready: bool,
    provider: Option<&'static str>,
    model: Option<String>,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct LivenessResponse {
    status: &'static str,
    timestamp: String,
    uptime: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthInfoResponse {
    service: &'static str,
    version: &'static str,
    start_time: String,
    uptime: u64,
}

pub async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: format!("{SERVICE_NAME} is running!"),
    })
}

async fn status(State(state): State<AppState>) -> Response {
    let gateway = state.coach().map(|coach| coach.gateway());
    let ready = gateway.is_some();

    let response = HealthStatusResponse {
        status: if ready { "ok" } else { "degraded" },
        gateway_ready: ready,
        provider: gateway.map(|g| g.provider().as_str()),
        model: gateway.map(|g| g.model().to_string()),
        timestamp: now_iso(),
    };

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(response)).into_response()
}

async fn live(State(state): State<AppState>) -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "healthy",
        timestamp: now_iso(),
        uptime: state.uptime_seconds(),
    })
}

async fn info(State(state): State<AppState>) -> Json<HealthInfoResponse> {
    Json(HealthInfoResponse {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        start_time: system_time_iso(state.started_at_system()),
        uptime: state.uptime_seconds(),
    })
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn system_time_iso(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Millis, true)
}
