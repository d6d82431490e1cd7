//! # Sales Dashboard 主程序
//!
//! `serve` 启动 HTTP 服务；`summary` 执行一次周期汇总并把 JSON 打印到标准输出

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use sales_dashboard::{
    DashboardError, Result,
    api::handlers::validation::{SummaryRequest, ValidatedSummary, validate_summary},
    api::{ApiServer, AppContext},
    batch::BatchService,
    config::{BatchConfig, ConfigManager},
    ldebug, lerror, linfo,
    logging::{self, LogComponent, LogStage},
    provider::build_provider,
};

#[derive(Parser)]
#[command(name = "sales-dashboard")]
#[command(about = "Batching and aggregation backend for the sales reporting dashboard")]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认 config/config.{RUST_ENV}.toml）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 日志级别（RUST_LOG 优先）
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Run one period summary and print the JSON response
    Summary {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: String,
        /// day, week or month
        #[arg(long, default_value = "week")]
        period: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level.as_deref());

    if let Err(e) = run(cli).await {
        lerror!(
            "system",
            LogStage::Error,
            LogComponent::Main,
            "service_failed",
            &format!("运行失败: {e}")
        );
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let manager = ConfigManager::load(cli.config.as_deref())?;
    ldebug!(
        "system",
        LogStage::Startup,
        LogComponent::Main,
        "config_source",
        "使用的配置来源",
        source = manager.source()
    );
    let config = manager.into_config();
    let provider = build_provider(&config.provider, &config.cache)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            linfo!(
                "system",
                LogStage::Startup,
                LogComponent::Main,
                "service_starting",
                "服务启动",
                provider = config.provider.endpoint_url(),
                max_concurrency = config.batch.max_concurrency
            );
            let context = Arc::new(AppContext::new(provider, config));
            ApiServer::new(context).serve().await?;
            linfo!(
                "system",
                LogStage::Shutdown,
                LogComponent::Main,
                "service_shutdown",
                "服务正常关闭"
            );
            Ok(())
        }
        Commands::Summary { start, end, period } => {
            let today = Local::now().date_naive();
            let summary = summary_args(start, end, period, today, &config.batch)?;
            let service = BatchService::new(provider, &config.batch);

            let response = service.summarize("cli", summary.range, summary.kind).await;
            let output = serde_json::to_string_pretty(&response.body)?;
            println!("{output}");

            if response.is_unavailable() {
                return Err(DashboardError::upstream_unavailable(
                    "上游数据服务不可用，未获取到任何数据",
                ));
            }
            Ok(())
        }
    }
}

/// 命令行参数与 HTTP 请求走同一套校验（日期、周期跨度、不晚于今天）
fn summary_args(
    start: String,
    end: String,
    period: String,
    today: NaiveDate,
    config: &BatchConfig,
) -> Result<ValidatedSummary> {
    let request = SummaryRequest {
        start_date: start,
        end_date: end,
        period,
    };
    Ok(validate_summary(&request, today, config)?)
}
