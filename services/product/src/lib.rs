//! product-service - 商品目录 CRUD 服务

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;

use std::sync::Arc;

use axum::Router;
use catalog_bootstrap::Infrastructure;
use catalog_errors::AppResult;
use tracing::info;

use api::product_routes;
use application::ProductService;
use domain::unit_of_work::UnitOfWorkFactory;
use infrastructure::persistence::{
    InMemoryUnitOfWorkFactory, PostgresUnitOfWorkFactory, run_migrations,
};

/// 根据基础设施选择存储后端并构建业务路由
pub async fn build_app(infra: Infrastructure) -> AppResult<Router> {
    let uow_factory: Arc<dyn UnitOfWorkFactory> = match infra.postgres_pool() {
        Some(pool) => {
            if infra.config().database.run_migrations {
                run_migrations(&pool).await?;
            }
            Arc::new(PostgresUnitOfWorkFactory::new(pool))
        }
        None => Arc::new(InMemoryUnitOfWorkFactory::new()),
    };
    info!("Product service initialized");

    let service = Arc::new(ProductService::new(uow_factory));
    Ok(product_routes(service))
}
