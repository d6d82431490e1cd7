//! # 周期汇总处理器
//!
//! `POST /dashboard/summary`：按统计周期推导对比区间并拆分子区间

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use axum::response::Response;
use axum::Json;
use chrono::Local;

use super::batch::validation_failed;
use super::body_rejection;
use super::validation::{SummaryRequest, validate_summary};
use crate::api::middleware::RequestId;
use crate::api::response;
use crate::api::server::AppState;
use crate::linfo;
use crate::logging::{LogComponent, LogStage};

/// 周期汇总
pub async fn summary(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<SummaryRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return response::app_error(body_rejection(&rejection)),
    };

    linfo!(
        request_id,
        LogStage::RequestStart,
        LogComponent::Api,
        "summary",
        "收到周期汇总请求",
        period = request.period.clone()
    );

    let today = Local::now().date_naive();
    let summary = match validate_summary(&request, today, &state.config.batch) {
        Ok(summary) => summary,
        Err(errors) => return validation_failed(&request_id, errors),
    };

    response::contract(
        state
            .service
            .summarize(&request_id, summary.range, summary.kind)
            .await,
    )
}
