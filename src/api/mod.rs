//! # HTTP API模块
//!
//! 对外提供批量对比、周期汇总与健康检查接口

pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;

pub use routes::create_routes;
pub use server::{ApiServer, AppContext, AppState, create_router};
