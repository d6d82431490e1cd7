//! # 批量接口集成测试
//!
//! 通过 `tower::ServiceExt::oneshot` 直接驱动完整路由（含中间件），上游使用 `MockSalesProvider`

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use sales_dashboard::api::{AppContext, AppState, create_router};
use sales_dashboard::batch::range::{PeriodKind, decompose};
use sales_dashboard::batch::DateRange;
use sales_dashboard::config::AppConfig;
use sales_dashboard::error::ProviderError;
use sales_dashboard::testing::MockSalesProvider;

fn router(mock: Arc<MockSalesProvider>, config: AppConfig) -> Router {
    create_router(AppState::new(Arc::new(AppContext::new(mock, config))))
}

fn days(start: &str, end: &str) -> Vec<String> {
    DateRange::parse(start, end)
        .unwrap()
        .days()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect()
}

fn with_week_totals(mock: MockSalesProvider, start: &str, end: &str, total: f64) -> MockSalesProvider {
    decompose(&DateRange::parse(start, end).unwrap(), PeriodKind::Week)
        .into_iter()
        .fold(mock, |mock, r| mock.with_total(r.range, total))
}

async fn post(router: Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-request-id", "test-request")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("test-request")
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_weekly_end_to_end() {
    let mock = MockSalesProvider::new();
    let mock = with_week_totals(mock, "2025-09-02", "2025-09-08", 1000.0);
    let mock = Arc::new(with_week_totals(mock, "2025-08-26", "2025-09-01", 800.0));

    let (status, body) = post(
        router(Arc::clone(&mock), AppConfig::default()),
        "/batch/weekly",
        &json!({
            "current_week": days("2025-09-02", "2025-09-08"),
            "previous_week": days("2025-08-26", "2025-09-01"),
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let metadata = &body["data"]["metadata"];
    assert_eq!(metadata["current_week_total"], 7000.0);
    assert_eq!(metadata["previous_week_total"], 5600.0);
    assert_eq!(metadata["week_over_week_change"], 25.0);
    assert_eq!(metadata["total_requests"], 14);
    assert_eq!(metadata["failed_requests"], 0);
    assert_eq!(metadata["success_rate"], 100.0);
    assert_eq!(body["data"]["current_week"]["2025-09-05"]["total"], 1000.0);
    assert_eq!(body["data"]["previous_week"]["2025-08-26"]["total"], 800.0);
    assert_eq!(mock.call_count(), 14);
}

#[tokio::test]
async fn test_weekly_partial_failure_degrades() {
    let day = DateRange::parse("2025-09-03", "2025-09-03").unwrap();
    let mock = Arc::new(
        MockSalesProvider::new()
            .with_default_total(100.0)
            .with_error(day, ProviderError::Timeout { timeout_ms: 30_000 }),
    );

    let (status, body) = post(
        router(mock, AppConfig::default()),
        "/batch/weekly",
        &json!({
            "current_week": days("2025-09-02", "2025-09-08"),
            "previous_week": days("2025-08-26", "2025-09-01"),
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let failed = &body["data"]["current_week"]["2025-09-03"];
    assert_eq!(failed["success"], false);
    assert_eq!(failed["total"], 0.0);
    assert!(failed["details"].is_null());
    assert_eq!(body["data"]["metadata"]["current_week_total"], 600.0);
    assert_eq!(body["data"]["metadata"]["failed_requests"], 1);
    assert_eq!(body["data"]["metadata"]["success_rate"], 92.9);
}

#[tokio::test]
async fn test_weekly_validation_map() {
    let mock = Arc::new(MockSalesProvider::new().with_default_total(1.0));

    let (status, body) = post(
        router(Arc::clone(&mock), AppConfig::default()),
        "/batch/weekly",
        &json!({
            "current_week": ["2025-09-02", "09/03/2025"],
            "previous_week": ["2025-08-26", "2025-08-26"],
        }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert!(body["errors"]["current_week.1"].is_array());
    assert!(body["errors"]["previous_week.1"].is_array());
    assert!(body["errors"].get("current_week.0").is_none());
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_invalid_json_body_is_422() {
    let request = Request::builder()
        .method("POST")
        .uri("/batch/weekly")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = router(Arc::new(MockSalesProvider::new()), AppConfig::default())
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_total_outage_is_503() {
    let mock = Arc::new(
        MockSalesProvider::new().with_default_error(ProviderError::connection("connection refused")),
    );

    let (status, body) = post(
        router(mock, AppConfig::default()),
        "/batch/weekly",
        &json!({
            "current_week": days("2025-09-02", "2025-09-08"),
            "previous_week": days("2025-08-26", "2025-09-01"),
        }),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_monthly_batch() {
    let mock = Arc::new(MockSalesProvider::new().with_default_total(500.0));

    let (status, body) = post(
        router(Arc::clone(&mock), AppConfig::default()),
        "/batch/monthly",
        &json!({
            "current_month_weeks": [
                {"week_key": "week_1", "week_name": "Week 1", "start_date": "2025-09-01", "end_date": "2025-09-07"},
                {"week_key": "week_2", "week_name": "Week 2", "start_date": "2025-09-08", "end_date": "2025-09-14"}
            ],
            "previous_month_weeks": [
                {"week_key": "week_1", "start_date": "2025-08-01", "end_date": "2025-08-03"}
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["current_month_weeks"]["week_2"]["label"], "Week 2");
    assert_eq!(data["current_month_weeks"]["week_2"]["start_date"], "2025-09-08");
    assert_eq!(data["previous_month_weeks"]["week_1"]["label"], "week_1");
    assert_eq!(data["metadata"]["current_month_total"], 1000.0);
    assert_eq!(data["metadata"]["previous_month_total"], 500.0);
    assert_eq!(data["metadata"]["month_over_month_change"], 100.0);
    assert_eq!(mock.call_count(), 3);
}

#[tokio::test]
async fn test_monthly_overlap_rejected() {
    let (status, body) = post(
        router(Arc::new(MockSalesProvider::new()), AppConfig::default()),
        "/batch/monthly",
        &json!({
            "current_month_weeks": [
                {"week_key": "a", "start_date": "2025-09-01", "end_date": "2025-09-07"},
                {"week_key": "b", "start_date": "2025-09-05", "end_date": "2025-09-09"}
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["current_month_weeks.1"].is_array());
}

#[tokio::test]
async fn test_summary_month() {
    let mock = Arc::new(MockSalesProvider::new().with_default_total(10.0));

    let (status, body) = post(
        router(Arc::clone(&mock), AppConfig::default()),
        "/dashboard/summary",
        &json!({"start_date": "2025-03-01", "end_date": "2025-03-31", "period": "month"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["period"], "month");
    assert_eq!(data["comparison_period"]["start_date"], "2025-02-01");
    assert_eq!(data["comparison_period"]["end_date"], "2025-02-28");
    // 2025-03-01 是周六：3 月触及 6 个自然周
    assert_eq!(data["current_period"]["breakdown"].as_object().unwrap().len(), 6);
    assert_eq!(data["current_period"]["breakdown"]["week_1"]["end_date"], "2025-03-02");
    assert_eq!(data["metadata"]["current_total"], 60.0);
}

#[tokio::test]
async fn test_summary_validation() {
    let (status, body) = post(
        router(Arc::new(MockSalesProvider::new()), AppConfig::default()),
        "/dashboard/summary",
        &json!({"start_date": "2025-03-01", "end_date": "2025-03-15", "period": "week"}),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["end_date"].is_array());
}

#[tokio::test]
async fn test_concurrency_bound_through_router() {
    let mock = Arc::new(
        MockSalesProvider::new()
            .with_default_total(1.0)
            .with_delay(Duration::from_millis(20)),
    );
    let mut config = AppConfig::default();
    config.batch.max_concurrency = 3;

    let (status, _) = post(
        router(Arc::clone(&mock), config),
        "/batch/weekly",
        &json!({
            "current_week": days("2025-09-02", "2025-09-08"),
            "previous_week": days("2025-08-26", "2025-09-01"),
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(mock.call_count(), 14);
    assert!(mock.peak_in_flight() <= 3);
}

#[tokio::test]
async fn test_api_prefix_and_health() {
    let mut config = AppConfig::default();
    config.server.api_prefix = "/api".to_string();
    let app = router(Arc::new(MockSalesProvider::new()), config);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["max_concurrency"], 6);
    assert_eq!(body["data"]["batch_timeout_seconds"], 90);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/ping").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"pong");

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
