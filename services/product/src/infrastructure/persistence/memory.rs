//! 进程内存储
//!
//! 工作单元内的写入先暂存，提交时一次性生效，回滚或丢弃时作废。
//! ID 由单调递增计数器分配，从 1 开始，回滚不会回收已分配的 ID。

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use catalog_errors::{AppError, AppResult};
use tokio::sync::Mutex;

use crate::domain::entities::Product;
use crate::domain::repositories::ProductRepository;
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use crate::domain::value_objects::ProductId;

#[derive(Debug, Default)]
struct MemoryState {
    last_id: i64,
    rows: BTreeMap<ProductId, Product>,
}

impl MemoryState {
    fn allocate_id(&mut self) -> ProductId {
        self.last_id += 1;
        ProductId(self.last_id)
    }
}

/// 暂存的写操作
#[derive(Debug, Clone)]
enum Staged {
    Inserted(Product),
    Updated(Product),
    Removed,
}

/// 内存 Unit of Work 工厂
#[derive(Clone, Default)]
pub struct InMemoryUnitOfWorkFactory {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryUnitOfWorkFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UnitOfWorkFactory for InMemoryUnitOfWorkFactory {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        Ok(Box::new(InMemoryUnitOfWork {
            repo: InMemoryProductRepository {
                state: self.state.clone(),
                staged: Mutex::new(BTreeMap::new()),
            },
        }))
    }
}

struct InMemoryUnitOfWork {
    repo: InMemoryProductRepository,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    fn products(&self) -> &dyn ProductRepository {
        &self.repo
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let InMemoryProductRepository { state, staged } = self.repo;
        let staged = staged.into_inner();
        let mut state = state.lock().await;

        for (id, write) in staged {
            match write {
                Staged::Inserted(product) => {
                    state.rows.insert(id, product);
                }
                // 已被其他工作单元删除的行不会被恢复
                Staged::Updated(product) => {
                    if let Some(row) = state.rows.get_mut(&id) {
                        *row = product;
                    }
                }
                Staged::Removed => {
                    state.rows.remove(&id);
                }
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}

struct InMemoryProductRepository {
    state: Arc<Mutex<MemoryState>>,
    staged: Mutex<BTreeMap<ProductId, Staged>>,
}

impl InMemoryProductRepository {
    /// 已提交数据叠加本工作单元的暂存写入
    async fn visible(&self) -> BTreeMap<ProductId, Product> {
        let staged = self.staged.lock().await;
        let mut rows = self.state.lock().await.rows.clone();

        for (id, write) in staged.iter() {
            match write {
                Staged::Inserted(product) | Staged::Updated(product) => {
                    rows.insert(*id, product.clone());
                }
                Staged::Removed => {
                    rows.remove(id);
                }
            }
        }
        rows
    }

    /// 按 ID 查找，暂存写入优先于已提交数据
    async fn lookup(&self, id: ProductId) -> Option<Product> {
        let staged = self.staged.lock().await;
        match staged.get(&id) {
            Some(Staged::Inserted(product)) | Some(Staged::Updated(product)) => {
                Some(product.clone())
            }
            Some(Staged::Removed) => None,
            None => self.state.lock().await.rows.get(&id).cloned(),
        }
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_all(&self) -> AppResult<Vec<Product>> {
        Ok(self.visible().await.into_values().collect())
    }

    async fn find_by_id(&self, id: ProductId) -> AppResult<Option<Product>> {
        Ok(self.lookup(id).await)
    }

    async fn insert(&self, product: &Product) -> AppResult<ProductId> {
        if let Some(id) = product.id() {
            return Err(AppError::internal(format!(
                "Product {} is already persisted",
                id
            )));
        }

        let mut staged = self.staged.lock().await;
        let id = self.state.lock().await.allocate_id();
        let stored = Product::restore(
            id,
            product.name(),
            product.description().map(str::to_string),
            product.price(),
        );
        staged.insert(id, Staged::Inserted(stored));

        Ok(id)
    }

    async fn update(&self, product: &Product) -> AppResult<()> {
        let id = product.persisted_id()?;
        if self.lookup(id).await.is_none() {
            return Err(AppError::not_found(format!("Product {} not found", id)));
        }

        let mut staged = self.staged.lock().await;
        let write = match staged.get(&id) {
            Some(Staged::Inserted(_)) => Staged::Inserted(product.clone()),
            _ => Staged::Updated(product.clone()),
        };
        staged.insert(id, write);
        Ok(())
    }

    async fn delete(&self, product: &Product) -> AppResult<()> {
        let id = product.persisted_id()?;
        if self.lookup(id).await.is_none() {
            return Err(AppError::not_found(format!("Product {} not found", id)));
        }

        self.staged.lock().await.insert(id, Staged::Removed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn committed_count(factory: &InMemoryUnitOfWorkFactory) -> usize {
        let uow = factory.begin().await.unwrap();
        let count = uow.products().find_all().await.unwrap().len();
        uow.rollback().await.unwrap();
        count
    }

    #[tokio::test]
    async fn test_ids_start_at_one() {
        let factory = InMemoryUnitOfWorkFactory::new();
        let uow = factory.begin().await.unwrap();

        let first = uow
            .products()
            .insert(&Product::new("A", 1, None))
            .await
            .unwrap();
        let second = uow
            .products()
            .insert(&Product::new("B", 2, None))
            .await
            .unwrap();
        uow.commit().await.unwrap();

        assert_eq!(first, ProductId(1));
        assert_eq!(second, ProductId(2));
    }

    #[tokio::test]
    async fn test_writes_visible_inside_unit_of_work_only() {
        let factory = InMemoryUnitOfWorkFactory::new();
        let uow = factory.begin().await.unwrap();

        let id = uow
            .products()
            .insert(&Product::new("A", 1, None))
            .await
            .unwrap();

        assert!(uow.products().find_by_id(id).await.unwrap().is_some());
        assert_eq!(committed_count(&factory).await, 0);

        uow.commit().await.unwrap();
        assert_eq!(committed_count(&factory).await, 1);
    }

    #[tokio::test]
    async fn test_rollback_discards_staged_writes() {
        let factory = InMemoryUnitOfWorkFactory::new();
        let uow = factory.begin().await.unwrap();
        uow.products()
            .insert(&Product::new("A", 1, None))
            .await
            .unwrap();
        uow.rollback().await.unwrap();

        assert_eq!(committed_count(&factory).await, 0);

        // 回滚消耗的 ID 不再复用
        let uow = factory.begin().await.unwrap();
        let id = uow
            .products()
            .insert(&Product::new("B", 1, None))
            .await
            .unwrap();
        uow.commit().await.unwrap();
        assert_eq!(id, ProductId(2));
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_product() {
        let factory = InMemoryUnitOfWorkFactory::new();
        let uow = factory.begin().await.unwrap();
        let ghost = Product::restore(ProductId(7), "Ghost", None, 1);

        let err = uow.products().update(&ghost).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = uow.products().delete(&ghost).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let unsaved = Product::new("New", 1, None);
        let err = uow.products().update(&unsaved).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn test_update_then_delete() {
        let factory = InMemoryUnitOfWorkFactory::new();
        let uow = factory.begin().await.unwrap();
        let id = uow
            .products()
            .insert(&Product::new("A", 1, None))
            .await
            .unwrap();
        uow.commit().await.unwrap();

        let uow = factory.begin().await.unwrap();
        let mut product = uow.products().find_by_id(id).await.unwrap().unwrap();
        product.overwrite("A2".to_string(), 2, Some("note".to_string()));
        uow.products().update(&product).await.unwrap();
        uow.commit().await.unwrap();

        let uow = factory.begin().await.unwrap();
        let stored = uow.products().find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored, product);
        uow.products().delete(&stored).await.unwrap();
        uow.commit().await.unwrap();

        assert_eq!(committed_count(&factory).await, 0);
    }

    #[tokio::test]
    async fn test_staged_delete_hides_row_only_inside_unit_of_work() {
        let factory = InMemoryUnitOfWorkFactory::new();
        let uow = factory.begin().await.unwrap();
        let id = uow
            .products()
            .insert(&Product::new("A", 1, None))
            .await
            .unwrap();
        uow.commit().await.unwrap();

        let deleting = factory.begin().await.unwrap();
        let product = deleting.products().find_by_id(id).await.unwrap().unwrap();
        deleting.products().delete(&product).await.unwrap();
        assert!(deleting.products().find_by_id(id).await.unwrap().is_none());

        let err = deleting.products().update(&product).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let other = factory.begin().await.unwrap();
        assert_eq!(other.products().find_by_id(id).await.unwrap(), Some(product));
        other.rollback().await.unwrap();

        deleting.commit().await.unwrap();
        let after = factory.begin().await.unwrap();
        assert!(after.products().find_by_id(id).await.unwrap().is_none());
        after.rollback().await.unwrap();
    }
}
