//! 声明式字段校验
//!
//! 每个字段对应一组有序约束，由通用检查器统一求值。
//! 所有规则都会执行，违规消息按声明顺序收集。

use catalog_errors::AppError;
use serde_json::{Map, Value};
use thiserror::Error;

/// 期望的 JSON 值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Integer,
}

impl ValueType {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            // 浮点数（包括 100.0）不算整数
            Self::Integer => value.as_i64().is_some(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
        }
    }
}

/// 单个约束
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// 缺失、null、false、空白字符串、空数组或空对象都视为空
    NotBlank,
    /// 非 null 时类型必须匹配
    Type(ValueType),
    /// 字符串长度（按字符计）在 [min, max] 之间
    Length { min: usize, max: usize },
}

impl Constraint {
    /// 检查一个字段值，返回违规消息
    ///
    /// `value` 为 None 表示字段缺失
    fn check(&self, value: Option<&Value>) -> Option<String> {
        match *self {
            Self::NotBlank => is_blank(value).then(|| "This value should not be blank.".to_string()),
            Self::Type(expected) => match value {
                None | Some(Value::Null) => None,
                Some(v) if expected.matches(v) => None,
                Some(_) => Some(format!(
                    "This value should be of type {}.",
                    expected.name()
                )),
            },
            Self::Length { min, max } => {
                let len = value.and_then(Value::as_str)?.chars().count();
                if len > max {
                    Some(format!(
                        "This value is too long. It should have {} {} or less.",
                        max,
                        plural_characters(max)
                    ))
                } else if len < min {
                    Some(format!(
                        "This value is too short. It should have {} {} or more.",
                        min,
                        plural_characters(min)
                    ))
                } else {
                    None
                }
            }
        }
    }
}

/// 整数 0 不算空
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(fields)) => fields.is_empty(),
        Some(Value::Bool(true)) | Some(Value::Number(_)) => false,
    }
}

fn plural_characters(n: usize) -> &'static str {
    if n == 1 { "character" } else { "characters" }
}

/// 字段规则
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub constraints: &'static [Constraint],
}

/// 校验失败时的有序消息列表
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .messages.join("\n"))]
pub struct ValidationErrors {
    pub messages: Vec<String>,
}

impl ValidationErrors {
    /// 是否有消息提到指定字段
    pub fn mentions(&self, field: &str) -> bool {
        let prefix = format!("{}: ", field);
        self.messages.iter().any(|m| m.starts_with(&prefix))
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::validation(errors.to_string())
    }
}

/// 按规则检查原始记录
///
/// 非对象输入按空记录处理，所有必填字段都会报告缺失
pub fn check(raw: &Value, rules: &[FieldRule]) -> Result<(), ValidationErrors> {
    let empty = Map::new();
    let record = raw.as_object().unwrap_or(&empty);

    let messages: Vec<String> = rules
        .iter()
        .flat_map(|rule| {
            let value = record.get(rule.field);
            rule.constraints
                .iter()
                .filter_map(move |c| c.check(value))
                .map(move |msg| format!("{}: {}", rule.field, msg))
        })
        .collect();

    if messages.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors { messages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const RULES: &[FieldRule] = &[
        FieldRule {
            field: "title",
            constraints: &[
                Constraint::NotBlank,
                Constraint::Type(ValueType::String),
                Constraint::Length { min: 1, max: 5 },
            ],
        },
        FieldRule {
            field: "count",
            constraints: &[Constraint::NotBlank, Constraint::Type(ValueType::Integer)],
        },
    ];

    #[test]
    fn test_valid_record_passes() {
        assert!(check(&json!({"title": "abc", "count": 0}), RULES).is_ok());
    }

    #[test]
    fn test_messages_follow_declaration_order() {
        let err = check(&json!({}), RULES).unwrap_err();
        assert_eq!(
            err.messages,
            vec![
                "title: This value should not be blank.",
                "count: This value should not be blank.",
            ]
        );
    }

    #[test]
    fn test_whitespace_only_is_blank() {
        let err = check(&json!({"title": "   ", "count": 1}), RULES).unwrap_err();
        assert_eq!(err.messages, vec!["title: This value should not be blank."]);
    }

    #[test]
    fn test_false_and_empty_containers_are_blank() {
        let err = check(&json!({"title": false, "count": []}), RULES).unwrap_err();
        assert_eq!(
            err.messages,
            vec![
                "title: This value should not be blank.",
                "title: This value should be of type string.",
                "count: This value should not be blank.",
                "count: This value should be of type integer.",
            ]
        );

        let err = check(&json!({"title": {}, "count": true}), RULES).unwrap_err();
        assert_eq!(
            err.messages,
            vec![
                "title: This value should not be blank.",
                "title: This value should be of type string.",
                "count: This value should be of type integer.",
            ]
        );
    }

    #[test]
    fn test_zero_is_not_blank() {
        assert!(check(&json!({"title": "a", "count": 0}), RULES).is_ok());
    }

    #[test]
    fn test_wrong_types_reported() {
        let err = check(&json!({"title": 12, "count": "12"}), RULES).unwrap_err();
        assert_eq!(
            err.messages,
            vec![
                "title: This value should be of type string.",
                "count: This value should be of type integer.",
            ]
        );
    }

    #[test]
    fn test_float_is_not_integer() {
        let err = check(&json!({"title": "a", "count": 1.5}), RULES).unwrap_err();
        assert!(err.mentions("count"));

        let err = check(&json!({"title": "a", "count": 100.0}), RULES).unwrap_err();
        assert!(err.mentions("count"));
    }

    #[test]
    fn test_length_counts_characters() {
        assert!(check(&json!({"title": "ééééé", "count": 1}), RULES).is_ok());

        let err = check(&json!({"title": "abcdef", "count": 1}), RULES).unwrap_err();
        assert_eq!(
            err.messages,
            vec!["title: This value is too long. It should have 5 characters or less."]
        );
    }

    #[test]
    fn test_too_short_message() {
        let rules = &[FieldRule {
            field: "code",
            constraints: &[Constraint::Length { min: 1, max: 3 }],
        }];
        let err = check(&json!({"code": ""}), rules).unwrap_err();
        assert_eq!(
            err.messages,
            vec!["code: This value is too short. It should have 1 character or more."]
        );
    }

    #[test]
    fn test_non_object_is_empty_record() {
        for raw in [json!(null), json!([1, 2]), json!("text"), json!(7)] {
            let err = check(&raw, RULES).unwrap_err();
            assert!(err.mentions("title"));
            assert!(err.mentions("count"));
        }
    }

    #[test]
    fn test_display_joins_with_newline() {
        let err = ValidationErrors {
            messages: vec!["a: x".to_string(), "b: y".to_string()],
        };
        assert_eq!(err.to_string(), "a: x\nb: y");

        let app: AppError = err.into();
        assert_eq!(app.status_code(), 400);
        assert_eq!(app.message(), "a: x\nb: y");
    }
}
