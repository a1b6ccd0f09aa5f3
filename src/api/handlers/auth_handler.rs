use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::auth_dto::*, dto::MISSING_FIELDS_MESSAGE, extract::ApiJson},
    error::AppError,
    security::AuthUser,
};

pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account = request.into_new_account()?;
    debug!("Registering {} as {}", account.email, account.role);

    let user = state.account_service.register(account).await?;
    state.metrics().record_registration();

    let response = RegisterResponse {
        message: "User registered successfully".to_string(),
        user: UserResponse::from(&user),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (email, password) = match (request.email, request.password) {
        (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
            (email, password)
        }
        _ => return Err(AppError::Validation(MISSING_FIELDS_MESSAGE.to_string())),
    };

    let outcome = state.account_service.login(&email, &password).await;
    state.metrics().record_login(outcome.is_ok());
    let outcome = outcome?;

    Ok(Json(LoginResponse {
        user: UserResponse::from(&outcome.user),
        token: outcome.token.token,
        expires_at: outcome.token.expires_at,
    }))
}

pub async fn me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.account_service.get_profile(&user.id).await?;

    Ok(Json(MeResponse {
        user: UserResponse::from(&user),
        profile: profile.as_ref().map(ProfileResponse::from),
    }))
}
