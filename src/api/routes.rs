//! # 路由配置
//!
//! 定义所有API路由和路由组织

use axum::Router;
use axum::routing::{get, post};

use super::handlers::{batch, dashboard, system};
use super::server::AppState;

/// 创建所有路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // 批量对比路由
        .nest("/batch", batch_routes())
        // 通用周期汇总
        .route("/dashboard/summary", post(dashboard::summary))
        // 健康检查
        .route("/health", get(system::health))
        .route("/ping", get(system::ping))
        .with_state(state)
}

/// 批量对比路由
fn batch_routes() -> Router<AppState> {
    Router::new()
        .route("/weekly", post(batch::weekly))
        .route("/monthly", post(batch::monthly))
}
