//! # HTTP 服务器
//!
//! Axum HTTP服务器，对外提供批量对比与健康检查接口

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use std::net::{IpAddr, SocketAddr};
use std::ops::Deref;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::middleware::request_id_middleware;
use crate::batch::BatchService;
use crate::config::{AppConfig, ServerConfig};
use crate::error::{DashboardError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::provider::SalesDataProvider;
use crate::{linfo, lwarn};

/// 请求处理共享的上下文
pub struct AppContext {
    pub service: BatchService,
    pub config: AppConfig,
    pub started_at: Instant,
}

impl AppContext {
    #[must_use]
    pub fn new(provider: Arc<dyn SalesDataProvider>, config: AppConfig) -> Self {
        Self {
            service: BatchService::new(provider, &config.batch),
            config,
            started_at: Instant::now(),
        }
    }
}

/// 服务器应用状态
#[derive(Clone)]
pub struct AppState {
    context: Arc<AppContext>,
}

impl AppState {
    #[must_use]
    pub const fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }
}

impl Deref for AppState {
    type Target = AppContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

/// HTTP 服务器
pub struct ApiServer {
    config: ServerConfig,
    router: Router,
}

impl ApiServer {
    /// 创建新的服务器
    #[must_use]
    pub fn new(context: Arc<AppContext>) -> Self {
        let config = context.config.server.clone();
        let router = create_router(AppState::new(context));
        Self { config, router }
    }

    /// 绑定地址
    pub fn bind_address(&self) -> Result<SocketAddr> {
        let ip = self.config.host.parse::<IpAddr>().map_err(|e| {
            DashboardError::config_with_source(
                format!("无效的监听地址: {}", self.config.host),
                e,
            )
        })?;
        Ok(SocketAddr::new(ip, self.config.port))
    }

    /// 启动服务器，收到 Ctrl+C 后优雅退出
    pub async fn serve(self) -> Result<()> {
        let addr = self.bind_address()?;

        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::ServerSetup,
            "server_start",
            &format!("Starting sales dashboard server on {addr}")
        );

        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            DashboardError::server_start_with_source(format!("绑定端口失败: {addr}"), e)
        })?;

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DashboardError::network_with_source("HTTP服务器运行错误", e))?;

        linfo!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "server_stopped",
            "HTTP服务器已停止"
        );
        Ok(())
    }
}

/// 构建完整的路由（含中间件），测试中也直接使用
pub fn create_router(state: AppState) -> Router {
    let config = state.config.server.clone();
    let api_routes = super::routes::create_routes(state);

    let mut app = if config.api_prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(&config.api_prefix, api_routes)
    };

    let service_builder = ServiceBuilder::new().layer(TraceLayer::new_for_http());
    if config.enable_cors {
        app = app.layer(service_builder.layer(cors_layer(&config)));
    } else {
        app = app.layer(service_builder);
    }

    // 最外层，TraceLayer 之前就能拿到请求ID
    app.layer(axum::middleware::from_fn(request_id_middleware))
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::ORIGIN,
        ]);

    if config.cors_origins.iter().any(|origin| origin == "*") {
        return cors_layer.allow_origin(Any);
    }

    let origins = config
        .cors_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<std::result::Result<Vec<_>, _>>();

    match origins {
        Ok(origins) => cors_layer.allow_origin(origins),
        Err(e) => {
            lwarn!(
                "system",
                LogStage::Startup,
                LogComponent::ServerSetup,
                "cors_config_fail",
                &format!("Invalid CORS origin configuration: {e}, falling back to allow any")
            );
            cors_layer.allow_origin(Any)
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        lwarn!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "signal_listen_fail",
            &format!("无法监听 Ctrl+C 信号: {e}")
        );
        std::future::pending::<()>().await;
    }

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::ServerSetup,
        "shutdown_signal",
        "收到退出信号，开始优雅关闭"
    );
}
