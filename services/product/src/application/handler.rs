//! 商品业务处理

use std::sync::Arc;

use catalog_errors::{AppError, AppResult};
use metrics::counter;
use serde_json::Value;
use tracing::{info, warn};

use crate::domain::entities::{Product, ProductRecord};
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use crate::domain::value_objects::ProductId;

use super::commands::ValidatedProduct;

/// 商品服务
///
/// 无状态，每次调用打开自己的工作单元
pub struct ProductService {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
}

impl ProductService {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { uow_factory }
    }

    /// 查询全部商品
    pub async fn list_all(&self) -> AppResult<Vec<ProductRecord>> {
        let uow = self.uow_factory.begin().await?;
        let result = uow.products().find_all().await;
        let products = finish(uow, result).await?;

        Ok(products.iter().map(Product::to_record).collect())
    }

    /// 根据 ID 获取商品
    pub async fn get_by_id(&self, id: ProductId) -> AppResult<Product> {
        let uow = self.uow_factory.begin().await?;
        let result = uow.products().find_by_id(id).await;

        finish(uow, result)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Product {} not found", id)))
    }

    /// 校验并创建商品
    pub async fn create(&self, raw: &Value) -> AppResult<ProductRecord> {
        let input = validate(raw)?;
        let mut product = Product::new(input.name, input.price, input.description);

        let uow = self.uow_factory.begin().await?;
        let result = uow.products().insert(&product).await;
        let id = finish(uow, result).await?;
        product.mark_persisted(id)?;

        counter!("products_created_total").increment(1);
        info!(product_id = %id, name = %product.name(), "Product created");

        Ok(product.to_record())
    }

    /// 校验并整体覆盖已存在的商品
    ///
    /// 校验失败时商品保持不变
    pub async fn update(&self, mut product: Product, raw: &Value) -> AppResult<ProductRecord> {
        let id = product.persisted_id()?;
        let input = validate(raw)?;
        product.overwrite(input.name, input.price, input.description);

        let uow = self.uow_factory.begin().await?;
        let result = uow.products().update(&product).await;
        finish(uow, result).await?;

        counter!("products_updated_total").increment(1);
        info!(product_id = %id, "Product updated");

        Ok(product.to_record())
    }

    /// 删除商品
    pub async fn delete(&self, product: Product) -> AppResult<()> {
        let id = product.persisted_id()?;

        let uow = self.uow_factory.begin().await?;
        let result = uow.products().delete(&product).await;
        finish(uow, result).await?;

        counter!("products_deleted_total").increment(1);
        info!(product_id = %id, "Product deleted");

        Ok(())
    }
}

fn validate(raw: &Value) -> AppResult<ValidatedProduct> {
    ValidatedProduct::from_raw(raw).inspect_err(|e| {
        if let AppError::Validation(detail) = e {
            counter!("product_validation_failures_total").increment(1);
            info!(violations = detail.lines().count(), "Product input rejected");
        }
    })
}

/// 成功时提交，失败时回滚后返回原错误
async fn finish<T>(uow: Box<dyn UnitOfWork>, result: AppResult<T>) -> AppResult<T> {
    match result {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = uow.rollback().await {
                warn!(error = %rollback_err, "Failed to roll back unit of work");
            }
            Err(e)
        }
    }
}
