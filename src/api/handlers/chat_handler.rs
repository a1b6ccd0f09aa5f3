use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::chat_dto::*, extract::ApiJson},
    error::AppError,
    security::AuthUser,
    services::ChatInput,
};

/// 消息在鉴权之前校验，未登录时发送空消息也得到 400
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<ChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    let message = request
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Message is required".to_string()))?;

    let user_id = state.authenticate(&headers)?;
    debug!(
        "Chat request from {} (conversation: {:?})",
        user_id, request.conversation_id
    );

    let result = state
        .tutor_service
        .chat(ChatInput {
            user_id,
            message,
            conversation_id: request.conversation_id,
            subject: request.subject,
            topic: request.topic,
        })
        .await;
    state
        .metrics()
        .record_chat(matches!(result, Err(AppError::AiService(_))));

    Ok(Json(ChatResponse::from(result?)))
}

pub async fn list_conversations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let summaries = state.tutor_service.list_conversations(&user.id).await?;

    Ok(Json(ConversationListResponse {
        conversations: summaries.iter().map(ConversationResponse::from).collect(),
    }))
}

pub async fn get_conversation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let detail = state.tutor_service.get_conversation(&user.id, &id).await?;
    Ok(Json(ConversationDetailResponse::from(&detail)))
}

pub async fn delete_conversation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.tutor_service.delete_conversation(&user.id, &id).await?;

    Ok(Json(DeleteResponse {
        message: "Conversation deleted".to_string(),
    }))
}
