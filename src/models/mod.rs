//! 数据模型模块
//!
//! 用户、角色档案、AI 导师会话以及学习进度的领域实体。

pub mod conversation;
pub mod learning;
pub mod profile;
pub mod user;

pub use conversation::{Conversation, Message, MessageRole, title_from_message};
pub use learning::{Assignment, AssignmentStatus, SubjectProgress};
pub use profile::{GradeLevel, ParentProfile, StudentProfile, TeacherProfile, UserProfile};
pub use user::{User, UserRole, normalize_email};
