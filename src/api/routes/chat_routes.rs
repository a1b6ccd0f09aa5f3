//! Chat Routes
//!
//! AI 导师对话与会话管理。

use axum::{
    Router,
    routing::{get, post},
};

use crate::api::app_state::AppState;
use crate::api::handlers::chat_handler::*;

/// 创建 AI 导师路由器
pub fn create_chat_router() -> Router<AppState> {
    Router::new()
        .route("/ai/chat", post(chat))
        .route("/ai/conversations", get(list_conversations))
        .route(
            "/ai/conversations/:id",
            get(get_conversation).delete(delete_conversation),
        )
}
