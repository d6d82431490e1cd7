//! # 系统信息处理器

use axum::extract::State;
use axum::response::Response;
use serde::Serialize;

use crate::api::response;
use crate::api::server::AppState;

#[derive(Debug, Serialize)]
struct HealthInfo {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    uptime_seconds: u64,
    max_concurrency: usize,
    batch_timeout_seconds: u64,
    cache_enabled: bool,
}

/// 健康检查
pub async fn health(State(state): State<AppState>) -> Response {
    response::success(HealthInfo {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        max_concurrency: state.service.dispatcher().max_concurrency(),
        batch_timeout_seconds: state.service.dispatcher().batch_timeout().as_secs(),
        cache_enabled: state.config.cache.enabled,
    })
}

/// 简单的存活探针
pub async fn ping() -> &'static str {
    "pong"
}
