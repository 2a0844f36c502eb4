//! 健康检查模块
//!
//! 提供 /health、/ready 和 /metrics 端点

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use catalog_adapter_postgres::check_connection;
use catalog_telemetry::HealthStatus;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use sqlx::PgPool;

use crate::Infrastructure;

/// 健康检查端点共享状态
#[derive(Clone)]
pub struct HealthState {
    postgres_pool: Option<PgPool>,
    metrics: Option<PrometheusHandle>,
    version: &'static str,
}

impl HealthState {
    pub fn new(infra: &Infrastructure, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            postgres_pool: infra.postgres_pool(),
            metrics,
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// 执行就绪检查（readiness）
    pub async fn readiness(&self) -> HealthStatus {
        let mut status = HealthStatus::new();

        match &self.postgres_pool {
            Some(pool) => match check_connection(pool).await {
                Ok(()) => status.add_check("postgres", true, None),
                Err(e) => status.add_check("postgres", false, Some(e.to_string())),
            },
            None => status.add_check("store", true, Some("in-memory".to_string())),
        }

        status
    }
}

#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// 健康检查路由
pub fn health_routes(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Liveness 端点处理器
async fn health_handler(State(state): State<HealthState>) -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "healthy",
        version: state.version,
    })
}

/// Readiness 端点处理器
async fn ready_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let status = state.readiness().await;
    let code = if status.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

/// Metrics 端点处理器
async fn metrics_handler(State(state): State<HealthState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
