//! Unit of Work 模式
//!
//! 为一次请求内的仓储操作提供显式的提交边界。

use async_trait::async_trait;
use catalog_errors::AppResult;

use crate::domain::repositories::ProductRepository;

/// Unit of Work trait
///
/// # 使用示例
///
/// ```ignore
/// let uow = uow_factory.begin().await?;
///
/// let id = uow.products().insert(&product).await?;
///
/// // 提交事务
/// uow.commit().await?;
/// ```
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// 获取商品 Repository
    fn products(&self) -> &dyn ProductRepository;

    /// 提交事务
    ///
    /// 成功时所有更改将持久化，失败时自动回滚。
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// 回滚事务
    ///
    /// 撤销所有未提交的更改。
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Unit of Work 工厂 trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    /// 开始新的事务
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;
}
