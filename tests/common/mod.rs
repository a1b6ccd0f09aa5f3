//! 集成测试公共工具

#![allow(dead_code)]

use ai_tutor::api::initialize_api;
use ai_tutor::config::AppConfig;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

/// 内存存储 + 低成本 bcrypt 的开发配置
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.bcrypt_cost = 4;
    config
}

pub async fn build_app(config: &AppConfig) -> Router {
    initialize_api(config).await.expect("router should build")
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

/// 注册学生并返回用户 id
pub async fn register_student(app: &Router, email: &str, grade: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": email,
            "password": "password123",
            "name": "Meera Iyer",
            "role": "STUDENT",
            "gradeLevel": grade
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["user"]["id"].as_str().unwrap().to_string()
}
