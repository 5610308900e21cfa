use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{AcceptMessagesRequest, SendMessageRequest};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    extract::ValidJson,
    response::ApiResponse,
    state::AppState,
};

// --- public routers ---

/// Owner-only endpoints behind the access token.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/accept-messages",
            get(get_accept_messages).post(set_accept_messages),
        )
        .route("/get-messages", get(get_messages))
        .route("/delete-message/:message_id", delete(delete_message))
}

/// Endpoints reachable from a shared profile link without a session.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/send-message", post(send_message))
}

// --- handlers ---

fn user_gone() -> AppError {
    AppError::not_found("User not found")
}

#[instrument(skip(state))]
pub async fn get_accept_messages(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<ApiResponse>> {
    let user = state
        .store
        .find_by_id(user_id)
        .await?
        .ok_or_else(user_gone)?;
    Ok(Json(
        ApiResponse::ok("Message acceptance status").accepting(user.is_accepting_messages),
    ))
}

#[instrument(skip(state, payload))]
pub async fn set_accept_messages(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidJson(payload): ValidJson<AcceptMessagesRequest>,
) -> AppResult<Json<ApiResponse>> {
    let user = state
        .store
        .set_accepting_messages(user_id, payload.accept_messages)
        .await?
        .ok_or_else(|| {
            warn!(%user_id, "acceptance toggle for missing user");
            AppError::not_found("Unable to find user to update message acceptance status")
        })?;
    info!(%user_id, accepting = user.is_accepting_messages, "message acceptance updated");
    Ok(Json(
        ApiResponse::ok("Message acceptance status updated successfully")
            .accepting(user.is_accepting_messages),
    ))
}

#[instrument(skip(state))]
pub async fn get_messages(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<ApiResponse>> {
    if state.store.find_by_id(user_id).await?.is_none() {
        return Err(user_gone());
    }
    let messages = state.store.list_messages(user_id).await?;
    Ok(Json(ApiResponse::ok("Messages fetched").messages(messages)))
}

#[instrument(skip(state, payload))]
pub async fn send_message(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse>)> {
    let user = state
        .store
        .find_by_username(payload.username.trim())
        .await?
        .ok_or_else(user_gone)?;

    if !user.is_accepting_messages {
        warn!(user_id = %user.id, "recipient not accepting messages");
        return Err(AppError::forbidden("User is not accepting messages"));
    }

    let msg = state
        .store
        .add_message(user.id, payload.content.trim())
        .await?;
    info!(user_id = %user.id, message_id = %msg.id, "message stored");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Message sent successfully")),
    ))
}

#[instrument(skip(state))]
pub async fn delete_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(message_id): Path<String>,
) -> AppResult<Json<ApiResponse>> {
    let message_id: Uuid = message_id
        .parse()
        .map_err(|_| AppError::validation("Invalid message id"))?;

    if !state.store.delete_message(user_id, message_id).await? {
        warn!(%user_id, %message_id, "delete of unknown message");
        return Err(AppError::not_found("Message not found or already deleted"));
    }
    info!(%user_id, %message_id, "message deleted");
    Ok(Json(ApiResponse::ok("Message deleted")))
}
