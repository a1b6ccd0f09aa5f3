//! Security Module
//!
//! Provides the security features of the AI Tutor API:
//! - Password hashing (bcrypt)
//! - Token issuing and bearer resolution (JWT)
//! - Security Middleware

pub mod auth;
pub mod middleware;
pub mod password;

pub use auth::{Claims, IssuedToken, TokenService, resolve_user_id};
pub use middleware::{AuthUser, security_headers_middleware};
pub use password::{hash_password, verify_password};
