//! # 配置管理器
//!
//! 负责定位配置文件、解析 TOML，并应用 `DASHBOARD_` 前缀的环境变量覆盖

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{AppConfig, validate_config};
use crate::error::{Context, DashboardError, Result};
use crate::linfo;
use crate::logging::{LogComponent, LogStage};

/// 显式指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "SALES_DASHBOARD_CONFIG_PATH";

/// 环境变量覆盖前缀
pub const ENV_OVERRIDE_PREFIX: &str = "DASHBOARD_";

/// 配置来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// 从文件加载
    File(PathBuf),
    /// 默认配置文件不存在，使用内置默认值
    Defaults,
}

/// 配置管理器
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: AppConfig,
    source: ConfigSource,
}

impl ConfigManager {
    /// 加载配置
    ///
    /// 路径优先级：参数 > `SALES_DASHBOARD_CONFIG_PATH` > `config/config.{RUST_ENV}.toml`。
    /// 显式指定的文件不存在时报错；默认文件不存在时回退到内置默认值。
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let explicit = explicit_path
            .map(Path::to_path_buf)
            .or_else(|| env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from));

        let (mut config, source) = match explicit {
            Some(path) => (Self::load_config_file(&path)?, ConfigSource::File(path)),
            None => {
                let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
                let path = PathBuf::from(format!("config/config.{env_name}.toml"));
                if path.exists() {
                    (Self::load_config_file(&path)?, ConfigSource::File(path))
                } else {
                    warn!("默认配置文件不存在: {}, 使用内置默认配置", path.display());
                    (AppConfig::default(), ConfigSource::Defaults)
                }
            }
        };

        let overrides = Self::build_env_overrides(env::vars());
        Self::apply_env_overrides(&mut config, &overrides)?;
        validate_config(&config)?;

        linfo!(
            "system",
            LogStage::Configuration,
            LogComponent::Config,
            "config_loaded",
            "配置加载完成",
            source = source,
            env_overrides = overrides.len()
        );

        Ok(Self { config, source })
    }

    /// 从字符串解析配置（不读取环境变量）
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        validate_config(&config)?;
        Ok(Self {
            config,
            source: ConfigSource::Defaults,
        })
    }

    /// 获取当前配置
    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn into_config(self) -> AppConfig {
        self.config
    }

    #[must_use]
    pub const fn source(&self) -> &ConfigSource {
        &self.source
    }

    /// 加载配置文件
    fn load_config_file(path: &Path) -> Result<AppConfig> {
        if !path.exists() {
            return Err(DashboardError::config(format!(
                "配置文件不存在: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;

        toml::from_str::<AppConfig>(&content)
            .with_context(|| format!("配置文件: {}", path.display()))
    }

    /// 构建环境变量覆盖映射
    ///
    /// 例如: `DASHBOARD_PROVIDER_BASE_URL` -> `provider.base_url`
    pub(crate) fn build_env_overrides<I>(vars: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let overrides: HashMap<String, String> = vars
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(ENV_OVERRIDE_PREFIX).and_then(|rest| {
                    let rest = rest.to_lowercase();
                    let (section, field) = rest.split_once('_')?;
                    Some((format!("{section}.{field}"), value))
                })
            })
            .collect();

        debug!("发现 {} 个环境变量覆盖", overrides.len());
        overrides
    }

    /// 应用环境变量覆盖
    pub(crate) fn apply_env_overrides(
        config: &mut AppConfig,
        overrides: &HashMap<String, String>,
    ) -> Result<()> {
        for (path, value) in overrides {
            debug!(
                "应用环境变量覆盖: {} = {}",
                path,
                if path.contains("token") { "***" } else { value }
            );
            Self::apply_override_to_config(config, path, value)?;
        }
        Ok(())
    }

    fn apply_override_to_config(config: &mut AppConfig, path: &str, value: &str) -> Result<()> {
        match path {
            "server.host" => config.server.host = value.to_string(),
            "server.port" => config.server.port = parse_value(path, value)?,
            "server.api_prefix" => config.server.api_prefix = value.to_string(),
            "provider.base_url" => config.provider.base_url = value.to_string(),
            "provider.endpoint_path" => config.provider.endpoint_path = value.to_string(),
            "provider.token" => config.provider.token = value.to_string(),
            "provider.timeout_seconds" => {
                config.provider.timeout_seconds = parse_value(path, value)?;
            }
            "provider.max_retries" => config.provider.retry.max_retries = parse_value(path, value)?,
            "batch.max_concurrency" => config.batch.max_concurrency = parse_value(path, value)?,
            "batch.batch_timeout_seconds" => {
                config.batch.batch_timeout_seconds = parse_value(path, value)?;
            }
            "cache.enabled" => config.cache.enabled = parse_value(path, value)?,
            "cache.ttl_seconds" => config.cache.ttl_seconds = parse_value(path, value)?,
            _ => warn!("未知的配置路径，忽略环境变量覆盖: {}", path),
        }
        Ok(())
    }
}

fn parse_value<T>(path: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse().map_err(|e| {
        DashboardError::config_with_source(format!("无效的配置值 {path}: {value}"), e)
    })
}
