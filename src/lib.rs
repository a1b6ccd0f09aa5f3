//! AI Tutor - 居家学习管理后端
//!
//! 用户注册与登录、学习仪表盘，以及转发到第三方补全服务并持久化对话的 AI 导师。

pub mod ai;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod security;
pub mod services;
pub mod storage;
