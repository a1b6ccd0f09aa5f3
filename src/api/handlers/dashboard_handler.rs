use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::dashboard_dto::*, extract::ApiJson},
    error::AppError,
    security::AuthUser,
};

pub async fn get_dashboard(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    debug!("Building dashboard for {}", user.id);
    let view = state.dashboard_service.dashboard(&user).await?;
    Ok(Json(DashboardResponse::from(&view)))
}

pub async fn update_progress(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<UpdateProgressRequest>,
) -> Result<impl IntoResponse, AppError> {
    let progress = state
        .dashboard_service
        .upsert_progress(&user, request.into_input()?)
        .await?;
    Ok(Json(SubjectProgressResponse::from(&progress)))
}

pub async fn create_assignment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let assignment = state
        .dashboard_service
        .create_assignment(&user, request.into_input()?)
        .await?;
    Ok((StatusCode::CREATED, Json(AssignmentResponse::from(&assignment))))
}

pub async fn update_assignment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateAssignmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let assignment = state
        .dashboard_service
        .update_assignment_status(&user, &id, request.into_status()?)
        .await?;
    Ok(Json(AssignmentResponse::from(&assignment)))
}
