//! 服务模块

pub mod account;
pub mod dashboard;
pub mod tutor;

pub use account::{AccountService, LoginOutcome, NewAccount, create_account_service};
pub use dashboard::{
    Activity, AssignmentInput, DashboardService, DashboardStats, DashboardView, ProgressInput,
    create_dashboard_service,
};
pub use tutor::{
    ChatInput, ChatReply, CompletionSettings, ConversationDetail, ConversationSummary,
    TutorService, create_tutor_service,
};
