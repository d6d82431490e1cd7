//! # Sales Dashboard Library
//!
//! 销售仪表盘批量对比服务核心库：日期区间计算、上游并发分发、结果聚合与响应契约

pub mod api;
pub mod batch;
pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{DashboardError, Result};
