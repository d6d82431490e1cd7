//! # 重试策略评估
//!
//! 上游请求失败后的重试决策：是否重试、等待多久。

use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::ProviderError;

/// 重试决策结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDecision {
    /// 是否应该重试
    pub should_retry: bool,
    /// 重试前等待时间
    pub delay: Duration,
    /// 原因
    pub reason: RetryReason,
}

/// 重试决策原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    /// 未配置重试预算
    NoRetryBudget,
    /// 达到重试上限
    MaxRetryExceeded,
    /// 错误不可重试（4xx、格式错误、业务拒绝）
    NotRetryable,
    /// 可以重试
    Retryable,
}

impl RetryReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoRetryBudget => "no_budget",
            Self::MaxRetryExceeded => "max_exceeded",
            Self::NotRetryable => "not_retryable",
            Self::Retryable => "retryable",
        }
    }
}

impl RetryDecision {
    /// 创建不重试的决策
    #[must_use]
    pub const fn no_retry(reason: RetryReason) -> Self {
        Self {
            should_retry: false,
            delay: Duration::ZERO,
            reason,
        }
    }

    /// 创建重试的决策
    #[must_use]
    pub const fn retry(delay: Duration) -> Self {
        Self {
            should_retry: true,
            delay,
            reason: RetryReason::Retryable,
        }
    }
}

/// 指数退避重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 首次失败之后最多重试的次数
    pub max_retries: u32,
    pub base_delay: Duration,
    pub backoff_factor: u32,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            backoff_factor: config.backoff_factor.max(1),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// 不重试
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            backoff_factor: 1,
            max_delay: Duration::ZERO,
        }
    }

    /// 第 `retry` 次重试（从 1 开始）前的等待时间
    ///
    /// `base * factor^(retry-1)`，不超过 `max_delay`。默认配置下依次为 1s、2s、4s。
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1);
        let multiplier = self.backoff_factor.saturating_pow(exponent);
        self.base_delay
            .saturating_mul(multiplier)
            .min(self.max_delay)
    }

    /// 评估失败后是否重试
    ///
    /// `retries_done` 是已经执行过的重试次数（不含首次请求）。
    #[must_use]
    pub fn evaluate(&self, error: &ProviderError, retries_done: u32) -> RetryDecision {
        if !error.is_retryable() {
            return RetryDecision::no_retry(RetryReason::NotRetryable);
        }

        if self.max_retries == 0 {
            return RetryDecision::no_retry(RetryReason::NoRetryBudget);
        }

        if retries_done >= self.max_retries {
            return RetryDecision::no_retry(RetryReason::MaxRetryExceeded);
        }

        RetryDecision::retry(self.delay_for(retries_done + 1))
    }
}
