//! 商品仓储接口

use async_trait::async_trait;
use catalog_errors::AppResult;

use crate::domain::entities::Product;
use crate::domain::value_objects::ProductId;

/// 商品仓储接口
///
/// 写操作只在所属工作单元提交后生效
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// 查询全部商品，顺序由存储决定
    async fn find_all(&self) -> AppResult<Vec<Product>>;

    /// 根据 ID 查找商品
    async fn find_by_id(&self, id: ProductId) -> AppResult<Option<Product>>;

    /// 插入新商品，返回存储分配的 ID
    async fn insert(&self, product: &Product) -> AppResult<ProductId>;

    /// 更新已持久化的商品，行不存在时返回 NotFound
    async fn update(&self, product: &Product) -> AppResult<()>;

    /// 删除已持久化的商品，行不存在时返回 NotFound
    async fn delete(&self, product: &Product) -> AppResult<()>;
}
