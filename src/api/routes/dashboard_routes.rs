//! Dashboard Routes
//!
//! 仪表盘、学科进度与作业。

use axum::{
    Router,
    routing::{get, patch, post, put},
};

use crate::api::app_state::AppState;
use crate::api::handlers::dashboard_handler::*;

/// 创建仪表盘路由器
pub fn create_dashboard_router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/progress", put(update_progress))
        .route("/assignments", post(create_assignment))
        .route("/assignments/:id", patch(update_assignment))
}
