use axum::http::HeaderMap;
use std::sync::Arc;

use crate::ai::CompletionClient;
use crate::config::AppConfig;
use crate::error::Result;
use crate::observability::{AppMetrics, ObservabilityState};
use crate::security::auth::{TokenService, resolve_user_id};
use crate::services::{
    AccountService, CompletionSettings, DashboardService, TutorService, create_account_service,
    create_dashboard_service, create_tutor_service,
};
use crate::storage::repository::Repositories;

/// Application state containing all shared services and security components
#[derive(Clone)]
pub struct AppState {
    /// Storage repositories
    pub repositories: Repositories,
    /// Registration, login and user lookup
    pub account_service: Arc<dyn AccountService>,
    /// AI tutor chat and conversation history
    pub tutor_service: Arc<dyn TutorService>,
    /// Progress, assignments and dashboard aggregation
    pub dashboard_service: Arc<dyn DashboardService>,
    /// JWT issuing and validation
    pub tokens: Arc<TokenService>,
    /// Accept a bare user id as bearer credential
    pub allow_raw_user_id: bool,
    /// Metrics and health
    pub observability: Arc<ObservabilityState>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("repositories", &self.repositories)
            .field("account_service", &"Arc<dyn AccountService>")
            .field("tutor_service", &"Arc<dyn TutorService>")
            .field("dashboard_service", &"Arc<dyn DashboardService>")
            .field("tokens", &self.tokens)
            .field("allow_raw_user_id", &self.allow_raw_user_id)
            .finish()
    }
}

impl AppState {
    /// Create new application state
    pub fn new(
        repositories: Repositories,
        account_service: Box<dyn AccountService>,
        tutor_service: Box<dyn TutorService>,
        dashboard_service: Box<dyn DashboardService>,
        tokens: Arc<TokenService>,
        allow_raw_user_id: bool,
        observability: Arc<ObservabilityState>,
    ) -> Self {
        Self {
            repositories,
            account_service: Arc::from(account_service),
            tutor_service: Arc::from(tutor_service),
            dashboard_service: Arc::from(dashboard_service),
            tokens,
            allow_raw_user_id,
            observability,
        }
    }

    /// Wire services from configuration
    pub fn from_config(
        config: &AppConfig,
        repositories: Repositories,
        client: Arc<dyn CompletionClient>,
    ) -> Self {
        let tokens = Arc::new(TokenService::from_config(&config.security));
        let account_service =
            create_account_service(&repositories, tokens.clone(), config.security.bcrypt_cost);
        let tutor_service = create_tutor_service(
            &repositories,
            client,
            CompletionSettings {
                temperature: config.ai.temperature,
                max_tokens: config.ai.max_tokens,
            },
        );
        let dashboard_service = create_dashboard_service(&repositories);
        let observability = Arc::new(ObservabilityState::new(
            env!("CARGO_PKG_VERSION"),
            repositories.health.clone(),
        ));

        Self::new(
            repositories,
            account_service,
            tutor_service,
            dashboard_service,
            tokens,
            config.security.allow_raw_user_id,
            observability,
        )
    }

    /// Resolve the caller's user id from the request headers
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<String> {
        resolve_user_id(headers, &self.tokens, self.allow_raw_user_id)
    }

    pub fn metrics(&self) -> &AppMetrics {
        &self.observability.metrics
    }
}
