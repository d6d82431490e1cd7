//! # 上游销售数据客户端
//!
//! 每个日期区间发起一次 `POST {base_url}/main_dashboard_data`，带 Bearer 鉴权、超时与指数退避重试。

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{ACCEPT, HeaderValue};
use serde::Serialize;
use std::time::Duration;

use super::retry::RetryPolicy;
use super::types::{DashboardSnapshot, RawProviderResponse};
use crate::batch::range::DateRange;
use crate::config::ProviderConfig;
use crate::error::{DashboardError, ProviderError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, linfo, lwarn};

/// 错误信息中保留的响应体长度上限
const ERROR_BODY_PREVIEW_CHARS: usize = 200;

/// 销售数据来源
///
/// 批量分发器只依赖这个 trait，测试中用 `testing::MockSalesProvider` 替换。
#[async_trait]
pub trait SalesDataProvider: Send + Sync {
    /// 获取单个日期区间的汇总数据
    async fn fetch_range(
        &self,
        range: &DateRange,
    ) -> std::result::Result<DashboardSnapshot, ProviderError>;
}

#[derive(Debug, Serialize)]
struct RangeRequestBody {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

/// 基于 reqwest 的上游客户端
#[derive(Debug, Clone)]
pub struct HttpProviderClient {
    http_client: reqwest::Client,
    endpoint: String,
    token: String,
    timeout: Duration,
    retry_policy: RetryPolicy,
}

impl HttpProviderClient {
    /// 根据配置构造客户端
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| DashboardError::config_with_source("创建上游HTTP客户端失败", e))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint_url(),
            token: config.token.clone(),
            timeout: config.timeout(),
            retry_policy: RetryPolicy::from(&config.retry),
        })
    }

    /// 替换重试策略
    #[must_use]
    pub const fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 单次请求，不含重试
    async fn send_once(
        &self,
        range: &DateRange,
    ) -> std::result::Result<DashboardSnapshot, ProviderError> {
        let body = RangeRequestBody {
            start_date: range.start(),
            end_date: range.end(),
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(&e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(&e))?;

        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
                message: preview(&text),
            });
        }

        let raw: RawProviderResponse = serde_json::from_str(&text).map_err(|e| {
            ProviderError::malformed(format!("invalid JSON body: {e}; body: {}", preview(&text)))
        })?;

        raw.into_snapshot()
    }

    fn map_transport_error(&self, err: &reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            ProviderError::connection(err.to_string())
        }
    }
}

#[async_trait]
impl SalesDataProvider for HttpProviderClient {
    async fn fetch_range(
        &self,
        range: &DateRange,
    ) -> std::result::Result<DashboardSnapshot, ProviderError> {
        let mut retries_done = 0;

        loop {
            ldebug!(
                "system",
                LogStage::ExternalApi,
                LogComponent::ProviderClient,
                "fetch_range",
                "请求上游销售数据",
                range = range.to_string(),
                attempt = retries_done + 1
            );

            let err = match self.send_once(range).await {
                Ok(snapshot) => return Ok(snapshot),
                Err(err) => err,
            };

            let decision = self.retry_policy.evaluate(&err, retries_done);
            if !decision.should_retry {
                lwarn!(
                    "system",
                    LogStage::ExternalApi,
                    LogComponent::ProviderClient,
                    "fetch_range_failed",
                    "上游请求失败，放弃重试",
                    range = range.to_string(),
                    error = err.to_string(),
                    attempts = retries_done + 1,
                    reason = decision.reason.as_str()
                );
                return Err(err);
            }

            linfo!(
                "system",
                LogStage::Retry,
                LogComponent::RetryPolicy,
                "retry_scheduled",
                "上游请求失败，计划重试",
                range = range.to_string(),
                error = err.to_string(),
                retry = retries_done + 1,
                delay_ms = decision.delay.as_millis()
            );

            tokio::time::sleep(decision.delay).await;
            retries_done += 1;
        }
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= ERROR_BODY_PREVIEW_CHARS {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
        cut.push_str("...");
        cut
    }
}
