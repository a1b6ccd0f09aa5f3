//! Routes 模块
//!
//! 定义 API 路由。

pub mod auth_routes;
pub mod chat_routes;
pub mod dashboard_routes;
