//! API 模块
//!
//! 提供 REST API 支持。

pub mod app_state;
pub mod dto;
pub mod extract;
pub mod handlers;
pub mod routes;

use crate::ai::{CompletionClient, create_completion_client};
use crate::api::app_state::AppState;
use crate::config::AppConfig;
use crate::config::config::ServerConfig;
use crate::error::AppError;
use crate::observability::{create_observability_router, metrics_middleware};
use crate::security::middleware::security_headers_middleware;
use crate::storage::StorageFactory;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

/// 根据允许的来源构建 CORS 层，`*` 表示任意来源
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", o);
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(86400))
}

pub fn create_router(app_state: AppState, server: &ServerConfig) -> Router {
    let api = Router::new()
        .merge(routes::auth_routes::create_auth_router())
        .merge(routes::chat_routes::create_chat_router())
        .merge(routes::dashboard_routes::create_dashboard_router());

    let observability = app_state.observability.clone();

    Router::new()
        .nest("/api", api)
        .with_state(app_state)
        .merge(create_observability_router(observability.clone()))
        .layer(DefaultBodyLimit::max(server.max_request_size))
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout.max(1),
        )))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(cors_layer(&server.cors_allowed_origins))
        .layer(axum::middleware::from_fn_with_state(
            observability,
            metrics_middleware,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
}

/// 按配置创建存储、AI 客户端与服务，返回完整路由
pub async fn initialize_api(config: &AppConfig) -> Result<Router, AppError> {
    info!("Initializing API router...");

    let repositories = StorageFactory::create(&config.database).await?;
    info!("Storage initialized: {:?}", repositories);

    let client: Arc<dyn CompletionClient> = Arc::from(create_completion_client(&config.ai)?);
    info!("AI completion client initialized (backend: {})", client.backend_name());

    let app_state = AppState::from_config(config, repositories, client);
    Ok(create_router(app_state, &config.server))
}
