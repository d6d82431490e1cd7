//! # 批量对比处理器
//!
//! `POST /batch/weekly` 与 `POST /batch/monthly`

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use axum::response::Response;
use axum::Json;
use chrono::Local;

use super::body_rejection;
use super::validation::{
    MonthlyBatchRequest, ValidatedBatch, WeeklyBatchRequest, validate_monthly, validate_weekly,
};
use crate::api::middleware::RequestId;
use crate::api::response;
use crate::api::server::AppState;
use crate::batch::contract::{monthly_response, weekly_response};
use crate::error::{DashboardError, ValidationErrors};
use crate::logging::{LogComponent, LogStage};
use crate::{linfo, lwarn};

/// 周对比
pub async fn weekly(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<WeeklyBatchRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return response::app_error(body_rejection(&rejection)),
    };

    linfo!(
        request_id,
        LogStage::RequestStart,
        LogComponent::Api,
        "weekly_batch",
        "收到周对比请求",
        current_days = request.current_week.len(),
        previous_days = request.previous_week.len()
    );

    let today = Local::now().date_naive();
    let batch = match validate_weekly(&request, today, &state.config.batch) {
        Ok(batch) => batch,
        Err(errors) => return validation_failed(&request_id, errors),
    };

    let result = run(&state, &request_id, &batch).await;
    response::contract(weekly_response(result))
}

/// 月对比
pub async fn monthly(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<MonthlyBatchRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return response::app_error(body_rejection(&rejection)),
    };

    linfo!(
        request_id,
        LogStage::RequestStart,
        LogComponent::Api,
        "monthly_batch",
        "收到月对比请求",
        current_weeks = request.current_month_weeks.len(),
        previous_weeks = request.previous_month_weeks.len()
    );

    let today = Local::now().date_naive();
    let batch = match validate_monthly(&request, today, &state.config.batch) {
        Ok(batch) => batch,
        Err(errors) => return validation_failed(&request_id, errors),
    };

    let result = run(&state, &request_id, &batch).await;
    response::contract(monthly_response(result))
}

async fn run(
    state: &AppState,
    request_id: &RequestId,
    batch: &ValidatedBatch,
) -> crate::batch::BatchResult {
    state
        .service
        .run(request_id, &batch.current, &batch.comparison)
        .await
}

pub(crate) fn validation_failed(request_id: &RequestId, errors: ValidationErrors) -> Response {
    lwarn!(
        request_id,
        LogStage::Validation,
        LogComponent::Api,
        "validation_failed",
        "请求参数校验失败",
        fields = errors.len()
    );
    response::app_error(DashboardError::validation(errors))
}
