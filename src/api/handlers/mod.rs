//! # 请求处理器

pub mod batch;
pub mod dashboard;
pub mod system;
pub mod validation;

use axum::extract::rejection::JsonRejection;

use crate::error::DashboardError;

/// 请求体无法解析为 JSON 时，按 `body` 字段报告校验错误
pub(crate) fn body_rejection(rejection: &JsonRejection) -> DashboardError {
    DashboardError::validation_field("body", rejection.body_text())
}
