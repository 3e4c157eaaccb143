//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    domain::{ConversationId, UserId},
    infrastructure::dto::http::{
        MessageRecordDto, NotificationRecordDto, PresenceRosterDto, PresenceUserDto,
    },
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Current presence roster
pub async fn get_presence(State(state): State<Arc<AppState>>) -> Json<PresenceRosterDto> {
    let roster = state.presence.roster().await;
    Json(PresenceRosterDto {
        users: roster.iter().map(PresenceUserDto::from).collect(),
    })
}

/// Message history of one conversation, oldest first
pub async fn get_conversation_messages(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
) -> Result<Json<Vec<MessageRecordDto>>, StatusCode> {
    let conversation_id =
        ConversationId::try_from(conversation_id).map_err(|_| StatusCode::BAD_REQUEST)?;
    let history = state.message_store.history(conversation_id).await;
    Ok(Json(history.iter().map(MessageRecordDto::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct NotificationsQuery {
    pub user_id: String,
}

/// Persisted notification records for one identity; the client's
/// reconciliation path for events missed on the live socket
pub async fn get_notifications(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NotificationsQuery>,
) -> Result<Json<Vec<NotificationRecordDto>>, StatusCode> {
    let user_id = UserId::try_from(query.user_id).map_err(|_| StatusCode::BAD_REQUEST)?;
    let records = state.notification_store.for_user(user_id).await;
    Ok(Json(records.iter().map(NotificationRecordDto::from).collect()))
}

/// Mark one persisted notification record as read
pub async fn mark_notification_read(
    State(state): State<Arc<AppState>>,
    Path(notification_id): Path<String>,
) -> StatusCode {
    state.notification_store.mark_read(&notification_id).await;
    StatusCode::NO_CONTENT
}
