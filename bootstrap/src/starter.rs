//! 服务启动器
//!
//! 提供统一的 HTTP 服务启动模式

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use catalog_config::AppConfig;
use catalog_errors::AppResult;
use catalog_telemetry::init_metrics;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::health::{HealthState, health_routes};
use crate::infrastructure::Infrastructure;
use crate::runtime::{init_runtime, shutdown_signal};

/// 运行 HTTP 服务
///
/// 这是服务的统一入口点。它负责：
/// 1. 加载配置
/// 2. 初始化运行时（日志、metrics）
/// 3. 创建基础设施资源（带重试）
/// 4. 调用用户提供的闭包构建业务路由
/// 5. 合并健康检查路由并启动服务器，处理 graceful shutdown
///
/// # 示例
///
/// ```ignore
/// use catalog_bootstrap::run;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     run("config", |infra| async move {
///         Ok(my_routes(infra.postgres_pool()))
///     }).await
/// }
/// ```
pub async fn run<F, Fut>(config_dir: &str, app_builder: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(Infrastructure) -> Fut,
    Fut: Future<Output = AppResult<Router>>,
{
    // 1. 加载配置
    let config = AppConfig::load(config_dir)?;

    // 2. 初始化运行时
    init_runtime(&config);
    info!("Starting {} service", config.app_name);

    let metrics = match init_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "Prometheus recorder not installed, /metrics disabled");
            None
        }
    };

    // 3. 创建基础设施（带重试）
    let infra = Infrastructure::from_config(config.clone()).await?;
    let health_state = HealthState::new(&infra, metrics);

    // 4. 构建业务路由
    let app = app_builder(infra)
        .await?
        .merge(health_routes(health_state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // 5. 启动服务器
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!(%addr, "HTTP server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Service stopped");

    Ok(())
}
