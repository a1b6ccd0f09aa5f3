//! 错误处理模块
//!
//! 定义应用程序的错误类型和错误处理逻辑。
//! 对外的 JSON 错误体格式为 `{ "error": ..., "code": ... }`，5xx 错误只返回公开消息，
//! 详细原因写入日志。

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 5xx 错误的公开消息
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// AI 服务失败时的公开消息
pub const AI_FAILURE_MESSAGE: &str = "Failed to get AI response";

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 数据库错误
    #[error("database error: {0}")]
    Database(String),

    /// 连接错误
    #[error("connection error: {0}")]
    Connection(String),

    /// 认证错误
    #[error("{0}")]
    Authentication(String),

    /// 授权错误
    #[error("{0}")]
    Authorization(String),

    /// 资源不存在
    #[error("{0}")]
    NotFound(String),

    /// 参数验证错误
    #[error("{0}")]
    Validation(String),

    /// 唯一性冲突（如重复邮箱）
    #[error("{0}")]
    Conflict(String),

    /// 配置错误
    #[error("configuration error: {0}")]
    Config(String),

    /// 序列化错误
    #[error("serialization error: {0}")]
    Serialization(String),

    /// AI 补全服务错误
    #[error("AI service error: {0}")]
    AiService(String),

    /// 内部错误
    #[error("internal error: {0}")]
    Internal(String),

    /// IO 错误
    #[error("IO error: {0}")]
    Io(String),
}

impl AppError {
    /// 返回给客户端的消息
    ///
    /// 4xx 错误原样返回；5xx 错误统一替换为公开消息。
    pub fn public_message(&self) -> String {
        match self {
            AppError::Authentication(msg)
            | AppError::Authorization(msg)
            | AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::AiService(_) => AI_FAILURE_MESSAGE.to_string(),
            AppError::Connection(_) => "Service unavailable".to_string(),
            _ => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

#[cfg(feature = "surrealdb")]
impl From<surrealdb::Error> for AppError {
    fn from(e: surrealdb::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::AiService(e.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        AppError::Authentication(format!("Invalid token: {}", e))
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("password hashing failed: {}", e))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("blocking task failed: {}", e))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid {}", field))
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join("; "))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

/// Axum response implementation for AppError
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code): (u16, String) = (&self).into();
        if status >= 500 {
            tracing::error!(code = %code, "request failed: {}", self);
        }
        let body = Json(ErrorResponse::new(&code, &self.public_message()));
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response()
    }
}

/// 错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误消息
    pub error: String,
    /// 错误代码
    pub code: String,
}

impl ErrorResponse {
    /// 创建新错误响应
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            error: message.to_string(),
            code: code.to_string(),
        }
    }
}

/// HTTP 状态码映射
impl From<&AppError> for (u16, String) {
    fn from(err: &AppError) -> (u16, String) {
        match err {
            AppError::NotFound(_) => (404, "NOT_FOUND".to_string()),
            AppError::Authentication(_) => (401, "UNAUTHORIZED".to_string()),
            AppError::Authorization(_) => (403, "FORBIDDEN".to_string()),
            AppError::Validation(_) => (400, "BAD_REQUEST".to_string()),
            AppError::Conflict(_) => (400, "CONFLICT".to_string()),
            AppError::Connection(_) => (503, "SERVICE_UNAVAILABLE".to_string()),
            AppError::AiService(_) => (500, "AI_SERVICE_ERROR".to_string()),
            _ => (500, "INTERNAL_ERROR".to_string()),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::Validation("x".into()), 400),
            (AppError::Conflict("x".into()), 400),
            (AppError::Authentication("x".into()), 401),
            (AppError::Authorization("x".into()), 403),
            (AppError::NotFound("x".into()), 404),
            (AppError::AiService("x".into()), 500),
            (AppError::Database("x".into()), 500),
        ];
        for (err, expected) in cases {
            let (status, _): (u16, String) = (&err).into();
            assert_eq!(status, expected, "{:?}", err);
        }
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = AppError::Database("connection refused on 10.0.0.3".into());
        assert_eq!(err.public_message(), INTERNAL_ERROR_MESSAGE);

        let err = AppError::AiService("HTTP 502".into());
        assert_eq!(err.public_message(), AI_FAILURE_MESSAGE);

        let err = AppError::Validation("Message is required".into());
        assert_eq!(err.public_message(), "Message is required");
    }

    #[tokio::test]
    async fn test_error_response_body() {
        let response = AppError::NotFound("User not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "User not found");
        assert_eq!(json["code"], "NOT_FOUND");
        assert!(json.get("details").is_none());
    }
}
