//! # API 响应结构
//!
//! 统一的 JSON 出口：批量接口的契约外壳、校验失败的字段错误表，以及通用错误响应。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::batch::{ContractResponse, ContractStatus};
use crate::error::{DashboardError, ValidationErrors};

/// # 标准成功响应
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub timestamp: DateTime<Utc>,
}

/// # 校验失败响应（422）
#[derive(Debug, Serialize)]
pub struct ValidationErrorResponse {
    pub success: bool,
    pub message: String,
    pub errors: ValidationErrors,
}

/// # 标准错误信息
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

/// # 标准错误响应
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub error: ErrorInfo,
    pub data: Option<()>,
    pub timestamp: DateTime<Utc>,
}

/// # API响应枚举
///
/// 统一所有API出口，方便转换为 `axum::response::Response`
#[derive(Debug)]
pub enum ApiResponse<T: Serialize> {
    Success(T),
    Contract(ContractResponse<T>),
    AppError(DashboardError),
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            Self::Success(data) => (
                StatusCode::OK,
                Json(SuccessResponse {
                    success: true,
                    data,
                    timestamp: Utc::now(),
                }),
            )
                .into_response(),
            Self::Contract(contract) => {
                let status = match contract.status {
                    ContractStatus::Ok => StatusCode::OK,
                    ContractStatus::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
                };
                (status, Json(contract.body)).into_response()
            }
            Self::AppError(error) => {
                let (status, code) = error.to_http_response_parts();
                if let DashboardError::Validation { errors } = error.root() {
                    let body = ValidationErrorResponse {
                        success: false,
                        message: "请求参数校验失败".to_string(),
                        errors: errors.clone(),
                    };
                    return (status, Json(body)).into_response();
                }
                error_body(status, code.to_string(), error.to_string())
            }
        }
    }
}

fn error_body(status: StatusCode, code: String, message: String) -> Response {
    let body = ErrorResponse {
        success: false,
        message: message.clone(),
        error: ErrorInfo { code, message },
        data: None,
        timestamp: Utc::now(),
    };
    (status, Json(body)).into_response()
}

/// # 便捷函数：成功响应
pub fn success<T: Serialize>(data: T) -> Response {
    ApiResponse::Success(data).into_response()
}

/// # 便捷函数：批量契约响应
pub fn contract<T: Serialize>(contract: ContractResponse<T>) -> Response {
    ApiResponse::Contract(contract).into_response()
}

/// # 便捷函数：应用错误响应
pub fn app_error(error: DashboardError) -> Response {
    ApiResponse::<()>::AppError(error).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_body() {
        let response = app_error(DashboardError::validation_field("current_week.1", "无效日期"));
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"]["current_week.1"][0], "无效日期");
    }

    #[tokio::test]
    async fn test_unavailable_contract_is_503() {
        let response = contract(crate::batch::contract::unavailable::<()>("down"));
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = body_json(response).await;
        assert_eq!(body, serde_json::json!({"success": false, "message": "down", "data": null}));
    }

    #[tokio::test]
    async fn test_internal_error_body() {
        let response = app_error(DashboardError::internal("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert!(body["data"].is_null());
    }
}
