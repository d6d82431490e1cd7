//! # 上游客户端集成测试
//!
//! 使用 wiremock 模拟上游 `main_dashboard_data` 接口

use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sales_dashboard::batch::DateRange;
use sales_dashboard::config::ProviderConfig;
use sales_dashboard::error::{ProviderError, ProviderErrorKind};
use sales_dashboard::provider::{HttpProviderClient, RetryPolicy, SalesDataProvider};

fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        base_delay: Duration::from_millis(10),
        backoff_factor: 2,
        max_delay: Duration::from_millis(50),
    }
}

fn client(server: &MockServer, timeout_seconds: u64, retry: RetryPolicy) -> HttpProviderClient {
    let config = ProviderConfig {
        base_url: server.uri(),
        token: "secret-token".to_string(),
        timeout_seconds,
        ..ProviderConfig::default()
    };
    HttpProviderClient::new(&config)
        .unwrap()
        .with_retry_policy(retry)
}

fn range() -> DateRange {
    DateRange::parse("2025-09-02", "2025-09-08").unwrap()
}

fn ok_body(total: serde_json::Value) -> serde_json::Value {
    json!({
        "success": true,
        "data": {
            "total_sales": total,
            "total_revenue": 900.0,
            "sales_count": 12,
            "cards": {"store_a": {"total": 600}, "store_b": {"total": 400}}
        }
    })
}

#[tokio::test]
async fn test_sends_bearer_token_and_date_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/main_dashboard_data"))
        .and(header("authorization", "Bearer secret-token"))
        .and(header("accept", "application/json"))
        .and(body_json(json!({"start_date": "2025-09-02", "end_date": "2025-09-08"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(json!(1000.0))))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = client(&server, 5, RetryPolicy::none())
        .fetch_range(&range())
        .await
        .unwrap();

    assert_eq!(snapshot.total_sales, 1000.0);
    assert_eq!(snapshot.sales_count, Some(12));
    assert_eq!(snapshot.cards["store_b"]["total"], 400);
}

#[tokio::test]
async fn test_numeric_string_totals_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(json!("1234.50"))))
        .mount(&server)
        .await;

    let snapshot = client(&server, 5, RetryPolicy::none())
        .fetch_range(&range())
        .await
        .unwrap();
    assert_eq!(snapshot.total_sales, 1234.5);
}

#[tokio::test]
async fn test_retries_server_errors_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .up_to_n_times(2)
        .with_priority(1)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(json!(50))))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = client(&server, 5, fast_retry(3))
        .fetch_range(&range())
        .await
        .unwrap();
    assert_eq!(snapshot.total_sales, 50.0);
}

#[tokio::test]
async fn test_gives_up_after_retry_budget() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server, 5, fast_retry(2))
        .fetch_range(&range())
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Http { status: 503, .. }));
    assert!(err.kind().is_unreachable());
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, 5, fast_retry(3))
        .fetch_range(&range())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ProviderError::Http {
            status: 401,
            message: "invalid token".to_string()
        }
    );
    assert_eq!(err.kind(), ProviderErrorKind::HttpClient);
}

#[tokio::test]
async fn test_malformed_body_is_typed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, 5, fast_retry(3))
        .fetch_range(&range())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_non_finite_total_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(json!("NaN"))))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, 5, fast_retry(3))
        .fetch_range(&range())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_success_false_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "message": "date range not allowed"})),
        )
        .mount(&server)
        .await;

    let err = client(&server, 5, RetryPolicy::none())
        .fetch_range(&range())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ProviderErrorKind::Rejected);
    assert!(err.to_string().contains("date range not allowed"));
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ok_body(json!(1)))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = client(&server, 1, RetryPolicy::none())
        .fetch_range(&range())
        .await
        .unwrap_err();
    assert_eq!(err, ProviderError::Timeout { timeout_ms: 1000 });
}

#[tokio::test]
async fn test_unreachable_provider_is_connection_error() {
    let config = ProviderConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        token: "t".to_string(),
        timeout_seconds: 2,
        connect_timeout_seconds: 1,
        ..ProviderConfig::default()
    };
    let client = HttpProviderClient::new(&config)
        .unwrap()
        .with_retry_policy(RetryPolicy::none());

    let err = client.fetch_range(&range()).await.unwrap_err();
    assert!(err.kind().is_unreachable());
}
