//! PostgreSQL Unit of Work 与事务内仓储

use std::sync::Arc;

use async_trait::async_trait;
use catalog_adapter_postgres::map_sqlx_error;
use catalog_errors::{AppError, AppResult};
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::Mutex;

use super::rows::ProductRow;
use crate::domain::entities::Product;
use crate::domain::repositories::ProductRepository;
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use crate::domain::value_objects::ProductId;

/// 仓储与工作单元共享的事务
pub type SharedTx = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

/// Postgres Unit of Work 工厂
pub struct PostgresUnitOfWorkFactory {
    pool: PgPool,
}

impl PostgresUnitOfWorkFactory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWorkFactory for PostgresUnitOfWorkFactory {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {}", e)))?;

        Ok(Box::new(PostgresUnitOfWork::new(tx)))
    }
}

/// Postgres Unit of Work 实现
pub struct PostgresUnitOfWork {
    tx: SharedTx,
    product_repo: TxProductRepository,
}

impl PostgresUnitOfWork {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        let tx = Arc::new(Mutex::new(Some(tx)));

        Self {
            product_repo: TxProductRepository::new(tx.clone()),
            tx,
        }
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    fn products(&self) -> &dyn ProductRepository {
        &self.product_repo
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed"))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit transaction: {}", e)))
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed"))?;

        tx.rollback()
            .await
            .map_err(|e| AppError::database(format!("Failed to rollback transaction: {}", e)))
    }
}

/// 事务内的商品仓储
pub struct TxProductRepository {
    tx: SharedTx,
}

impl TxProductRepository {
    pub fn new(tx: SharedTx) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl ProductRepository for TxProductRepository {
    async fn find_all(&self) -> AppResult<Vec<Product>> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;

        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, description, price FROM products ORDER BY id",
        )
        .fetch_all(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn find_by_id(&self, id: ProductId) -> AppResult<Option<Product>> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;

        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, description, price FROM products WHERE id = $1",
        )
        .bind(id.value())
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Product::from))
    }

    async fn insert(&self, product: &Product) -> AppResult<ProductId> {
        if let Some(id) = product.id() {
            return Err(AppError::internal(format!(
                "Product {} is already persisted",
                id
            )));
        }

        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO products (name, description, price)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(product.name())
        .bind(product.description())
        .bind(product.price())
        .fetch_one(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(ProductId(id))
    }

    async fn update(&self, product: &Product) -> AppResult<()> {
        let id = product.persisted_id()?;

        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;

        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $1, description = $2, price = $3
            WHERE id = $4
            "#,
        )
        .bind(product.name())
        .bind(product.description())
        .bind(product.price())
        .bind(id.value())
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Product {} not found", id)));
        }
        Ok(())
    }

    async fn delete(&self, product: &Product) -> AppResult<()> {
        let id = product.persisted_id()?;

        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;

        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.value())
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Product {} not found", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 需要 DATABASE_URL 指向可用的 PostgreSQL，运行: cargo test -- --ignored
    #[sqlx::test]
    #[ignore]
    async fn test_insert_and_find(pool: PgPool) {
        let factory = PostgresUnitOfWorkFactory::new(pool);

        let uow = factory.begin().await.unwrap();
        let id = uow
            .products()
            .insert(&Product::new("Widget", 100, None))
            .await
            .unwrap();
        uow.commit().await.unwrap();

        let uow = factory.begin().await.unwrap();
        let found = uow.products().find_by_id(id).await.unwrap().unwrap();
        uow.commit().await.unwrap();

        assert_eq!(found.id(), Some(id));
        assert_eq!(found.name(), "Widget");
        assert_eq!(found.price(), 100);
        assert!(found.description().is_none());
    }

    #[sqlx::test]
    #[ignore]
    async fn test_rollback_discards_insert(pool: PgPool) {
        let factory = PostgresUnitOfWorkFactory::new(pool);

        let uow = factory.begin().await.unwrap();
        uow.products()
            .insert(&Product::new("Widget", 100, None))
            .await
            .unwrap();
        uow.rollback().await.unwrap();

        let uow = factory.begin().await.unwrap();
        assert!(uow.products().find_all().await.unwrap().is_empty());
        uow.commit().await.unwrap();
    }

    #[sqlx::test]
    #[ignore]
    async fn test_update_and_delete_missing_row(pool: PgPool) {
        let factory = PostgresUnitOfWorkFactory::new(pool);
        let ghost = Product::restore(ProductId(404), "Ghost", None, 1);

        let uow = factory.begin().await.unwrap();
        let err = uow.products().update(&ghost).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = uow.products().delete(&ghost).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        uow.rollback().await.unwrap();
    }

    #[sqlx::test]
    #[ignore]
    async fn test_find_all_orders_by_id(pool: PgPool) {
        let factory = PostgresUnitOfWorkFactory::new(pool);

        let uow = factory.begin().await.unwrap();
        for name in ["B", "A"] {
            uow.products()
                .insert(&Product::new(name, 1, None))
                .await
                .unwrap();
        }
        uow.commit().await.unwrap();

        let uow = factory.begin().await.unwrap();
        let all = uow.products().find_all().await.unwrap();
        uow.commit().await.unwrap();

        let names: Vec<&str> = all.iter().map(Product::name).collect();
        assert_eq!(names, vec!["B", "A"]);
    }
}
