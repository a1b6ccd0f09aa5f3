//! DTO 模块
//!
//! 数据传输对象，用于 API 请求和响应的序列化。所有 JSON 字段使用 camelCase。

pub mod auth_dto;
pub mod chat_dto;
pub mod dashboard_dto;

pub use auth_dto::*;
pub use chat_dto::*;
pub use dashboard_dto::*;

use chrono::{DateTime, NaiveDate};
use serde_json::Value;

use crate::error::{AppError, Result};

/// 必填字段缺失或为空
pub const MISSING_FIELDS_MESSAGE: &str = "Missing required fields";

/// 去除首尾空白，空字符串视为未提供
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 表单数值：接受 JSON 数字或数字字符串（如 `"7"`、`85.5`），空值视为未提供
pub fn number_field(value: Option<Value>, field: &str) -> Result<Option<f64>> {
    let invalid = || AppError::Validation(format!("{} must be a number", field));
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or_else(invalid),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(invalid),
        Some(_) => Err(invalid()),
    }
}

/// 解析 `YYYY-MM-DD` 或 RFC 3339 时间戳中的日期
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_field_accepts_form_values() {
        assert_eq!(number_field(Some(serde_json::json!(7)), "Experience").unwrap(), Some(7.0));
        assert_eq!(number_field(Some(serde_json::json!(" 7 ")), "Experience").unwrap(), Some(7.0));
        assert_eq!(number_field(Some(serde_json::json!(85.5)), "Progress").unwrap(), Some(85.5));
        assert_eq!(number_field(Some(serde_json::json!("")), "Progress").unwrap(), None);
        assert_eq!(number_field(None, "Progress").unwrap(), None);

        let err = number_field(Some(serde_json::json!("lots")), "Experience").unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Experience must be a number"));
        assert!(number_field(Some(serde_json::json!([1])), "Progress").is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2012, 7, 9);
        assert_eq!(parse_date("2012-07-09"), expected);
        assert_eq!(parse_date("2012-07-09T10:00:00+05:30"), expected);
        assert_eq!(parse_date("09/07/2012"), None);
    }
}
