//! 数据库行映射结构

use sqlx::FromRow;

use crate::domain::entities::Product;
use crate::domain::value_objects::ProductId;

/// 商品数据库行
#[derive(Debug, FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product::restore(ProductId(row.id), row.name, row.description, row.price)
    }
}
