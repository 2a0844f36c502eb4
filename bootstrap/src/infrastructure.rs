//! 基础设施资源管理
//!
//! 根据配置创建服务依赖的存储资源

use catalog_adapter_postgres::{PostgresConfig, create_pool};
use catalog_config::{AppConfig, StoreBackend};
use catalog_errors::{AppError, AppResult};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::info;

use crate::retry::{RetryConfig, with_retry};

/// 基础设施资源容器
///
/// `PgPool` 内部是引用计数的，克隆开销很小
#[derive(Clone)]
pub struct Infrastructure {
    /// 应用配置
    config: AppConfig,
    /// PostgreSQL 连接池（内存后端时为 None）
    postgres_pool: Option<PgPool>,
}

impl Infrastructure {
    /// 从配置创建基础设施资源（带重试）
    pub async fn from_config(config: AppConfig) -> AppResult<Self> {
        Self::from_config_with_retry(config, &RetryConfig::default()).await
    }

    pub async fn from_config_with_retry(
        config: AppConfig,
        retry_config: &RetryConfig,
    ) -> AppResult<Self> {
        let postgres_pool = match config.database.backend {
            StoreBackend::Postgres => {
                let url = config.database.url.as_ref().ok_or_else(|| {
                    AppError::internal("database.url is required for the postgres backend")
                })?;
                let pg_config = PostgresConfig::new(url.expose_secret().as_str())
                    .with_max_connections(config.database.max_connections);

                let pool = with_retry(retry_config, "PostgreSQL connection", || {
                    let cfg = pg_config.clone();
                    async move { create_pool(&cfg).await }
                })
                .await?;
                info!(
                    max_connections = config.database.max_connections,
                    "PostgreSQL connection pool created"
                );
                Some(pool)
            }
            StoreBackend::Memory => {
                info!("Using in-memory store, data will not survive a restart");
                None
            }
        };

        Ok(Self {
            config,
            postgres_pool,
        })
    }

    /// 获取应用配置
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 获取 PostgreSQL 连接池
    pub fn postgres_pool(&self) -> Option<PgPool> {
        self.postgres_pool.clone()
    }
}
