//! 应用层
//!
//! 输入校验、命令和业务处理

pub mod commands;
pub mod handler;
pub mod validation;

pub use commands::*;
pub use handler::ProductService;
pub use validation::{Constraint, FieldRule, ValidationErrors, ValueType};
