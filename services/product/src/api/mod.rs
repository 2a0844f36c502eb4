//! HTTP API 层

mod http;

pub use http::{MessageResponse, product_routes};
