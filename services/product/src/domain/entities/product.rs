//! 商品实体

use catalog_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::ProductId;

/// 商品实体
///
/// 普通数据结构，修改字段不会产生任何持久化副作用，
/// 写入必须显式经过仓储和工作单元。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// 存储分配的 ID，持久化之前为 None
    id: Option<ProductId>,
    name: String,
    description: Option<String>,
    price: i64,
}

impl Product {
    /// 创建尚未持久化的商品
    pub fn new(name: impl Into<String>, price: i64, description: Option<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description,
            price,
        }
    }

    /// 从存储中还原商品
    pub fn restore(
        id: ProductId,
        name: impl Into<String>,
        description: Option<String>,
        price: i64,
    ) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            description,
            price,
        }
    }

    pub fn id(&self) -> Option<ProductId> {
        self.id
    }

    /// 已持久化商品的 ID
    pub fn persisted_id(&self) -> AppResult<ProductId> {
        self.id
            .ok_or_else(|| AppError::internal("Product has not been persisted yet"))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn price(&self) -> i64 {
        self.price
    }

    /// 整体覆盖可变字段，不支持部分更新
    pub fn overwrite(&mut self, name: String, price: i64, description: Option<String>) {
        self.name = name;
        self.price = price;
        self.description = description;
    }

    /// 记录存储分配的 ID，只允许一次
    pub fn mark_persisted(&mut self, id: ProductId) -> AppResult<()> {
        match self.id {
            Some(existing) => Err(AppError::internal(format!(
                "Product {} already has an id, refusing to reassign {}",
                existing, id
            ))),
            None => {
                self.id = Some(id);
                Ok(())
            }
        }
    }

    /// 序列化为对外的 JSON 记录
    pub fn to_record(&self) -> ProductRecord {
        ProductRecord {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
        }
    }
}

/// 商品的 JSON 记录形态
///
/// `{ "id": integer|null, "name": string, "description": string|null, "price": integer }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: Option<ProductId>,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
}

impl From<&Product> for ProductRecord {
    fn from(product: &Product) -> Self {
        product.to_record()
    }
}
