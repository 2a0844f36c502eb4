//! 商品写入命令

use catalog_errors::{AppError, AppResult};
use serde_json::Value;

use crate::application::validation::{self, Constraint, FieldRule, ValueType};

/// 商品字段规则，按声明顺序求值
pub const PRODUCT_RULES: &[FieldRule] = &[
    FieldRule {
        field: "name",
        constraints: &[
            Constraint::NotBlank,
            Constraint::Type(ValueType::String),
            Constraint::Length { min: 1, max: 255 },
        ],
    },
    FieldRule {
        field: "price",
        constraints: &[Constraint::NotBlank, Constraint::Type(ValueType::Integer)],
    },
    FieldRule {
        field: "description",
        constraints: &[
            Constraint::Type(ValueType::String),
            Constraint::Length { min: 0, max: 255 },
        ],
    },
];

/// 校验通过的商品输入
///
/// 只在一次 校验 -> 保存 调用内存在
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedProduct {
    pub name: String,
    pub price: i64,
    pub description: Option<String>,
}

impl ValidatedProduct {
    /// 校验原始 JSON 记录
    ///
    /// 规则违规返回 `AppError::Validation`，消息按行拼接
    pub fn from_raw(raw: &Value) -> AppResult<Self> {
        validation::check(raw, PRODUCT_RULES)?;
        Self::extract(raw)
    }

    /// 读取已通过规则检查的字段
    fn extract(raw: &Value) -> AppResult<Self> {
        let name = raw
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::internal("Checked product input has no string name"))?;
        let price = raw
            .get("price")
            .and_then(Value::as_i64)
            .ok_or_else(|| AppError::internal("Checked product input has no integer price"))?;

        Ok(Self {
            name: name.to_string(),
            price,
            description: raw
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn violations(raw: Value) -> Vec<String> {
        match ValidatedProduct::from_raw(&raw) {
            Err(AppError::Validation(detail)) => detail.lines().map(str::to_string).collect(),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_input_without_description() {
        let validated = ValidatedProduct::from_raw(&json!({"name": "Widget", "price": 100})).unwrap();

        assert_eq!(
            validated,
            ValidatedProduct {
                name: "Widget".to_string(),
                price: 100,
                description: None,
            }
        );
    }

    #[test]
    fn test_null_description_is_allowed() {
        let validated =
            ValidatedProduct::from_raw(&json!({"name": "W", "price": -3, "description": null}))
                .unwrap();
        assert_eq!(validated.price, -3);
        assert!(validated.description.is_none());
    }

    #[test]
    fn test_empty_description_is_kept() {
        let validated =
            ValidatedProduct::from_raw(&json!({"name": "W", "price": 0, "description": ""}))
                .unwrap();
        assert_eq!(validated.description.as_deref(), Some(""));
    }

    #[test]
    fn test_missing_fields_reported_in_order() {
        assert_eq!(
            violations(json!({})),
            vec![
                "name: This value should not be blank.",
                "price: This value should not be blank.",
            ]
        );
    }

    #[test]
    fn test_string_price_rejected() {
        assert_eq!(
            violations(json!({"name": "Widget", "price": "100"})),
            vec!["price: This value should be of type integer."]
        );
    }

    #[test]
    fn test_long_fields_rejected() {
        let long = "x".repeat(256);
        assert_eq!(
            violations(json!({"name": long, "price": 1, "description": long})),
            vec![
                "name: This value is too long. It should have 255 characters or less.",
                "description: This value is too long. It should have 255 characters or less.",
            ]
        );

        let exact = "y".repeat(255);
        assert!(ValidatedProduct::from_raw(&json!({"name": exact, "price": 1})).is_ok());
    }

    #[test]
    fn test_non_string_description_rejected() {
        assert_eq!(
            violations(json!({"name": "W", "price": 1, "description": 5})),
            vec!["description: This value should be of type string."]
        );
    }

    #[test]
    fn test_false_name_and_empty_price_are_blank() {
        assert_eq!(
            violations(json!({"name": false, "price": []})),
            vec![
                "name: This value should not be blank.",
                "name: This value should be of type string.",
                "price: This value should not be blank.",
                "price: This value should be of type integer.",
            ]
        );
    }

    #[test]
    fn test_extract_without_checked_fields_is_internal() {
        let err = ValidatedProduct::extract(&json!({"name": "W"})).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));

        let err = ValidatedProduct::extract(&json!({"price": 1})).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
