//! 商品 REST 路由
//!
//! | 方法 | 路径 | 成功 |
//! |---|---|---|
//! | GET | /products | 200 |
//! | GET | /products/{id} | 200 |
//! | POST | /products | 201 |
//! | PUT | /products/{id} | 200 |
//! | DELETE | /products/{id} | 204 |

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use catalog_errors::{AppError, AppResult};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::application::ProductService;
use crate::domain::entities::{Product, ProductRecord};
use crate::domain::value_objects::ProductId;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// 商品路由
pub fn product_routes(service: Arc<ProductService>) -> Router {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(show_product).put(update_product).delete(delete_product),
        )
        .with_state(service)
}

async fn list_products(
    State(service): State<Arc<ProductService>>,
) -> AppResult<Json<Vec<ProductRecord>>> {
    Ok(Json(service.list_all().await?))
}

async fn show_product(
    State(service): State<Arc<ProductService>>,
    Path(id): Path<String>,
) -> AppResult<Json<ProductRecord>> {
    let product = resolve(&service, &id).await?;
    Ok(Json(product.to_record()))
}

async fn create_product(
    State(service): State<Arc<ProductService>>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<ProductRecord>)> {
    let record = service.create(&parse_body(&body)).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_product(
    State(service): State<Arc<ProductService>>,
    Path(id): Path<String>,
    body: Bytes,
) -> AppResult<Json<ProductRecord>> {
    let product = resolve(&service, &id).await?;
    let record = service.update(product, &parse_body(&body)).await?;
    Ok(Json(record))
}

async fn delete_product(
    State(service): State<Arc<ProductService>>,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let product = resolve(&service, &id).await?;
    service.delete(product).await?;
    // 客户端依赖这条确认消息，204 仍带响应体
    Ok((
        StatusCode::NO_CONTENT,
        Json(MessageResponse {
            message: "Product deleted",
        }),
    ))
}

/// 路径 ID 解析为商品，非整数 ID 视为不存在
async fn resolve(service: &ProductService, raw_id: &str) -> AppResult<Product> {
    let id: ProductId = raw_id
        .parse()
        .map_err(|_| AppError::not_found(format!("Product {} not found", raw_id)))?;
    service.get_by_id(id).await
}

/// 请求体解析为 JSON，空或格式错误时按空记录处理
fn parse_body(body: &[u8]) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        debug!(error = %e, "Request body is not valid JSON");
        Value::Null
    })
}
