use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{
            RefreshRequest, SessionResponse, SessionUser, SignInRequest, SignUpRequest,
            UsernameQuery, VerifyCodeRequest,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        services::{self, Verified},
    },
    error::{AppError, AppResult},
    extract::ValidJson,
    response::ApiResponse,
    state::AppState,
    store::User,
    validation,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(sign_up))
        .route("/sign-in", post(sign_in))
        .route("/verify-code", post(verify_code))
        .route("/check-username-unique", get(check_username_unique))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn session(state: &AppState, user: User, message: &str) -> AppResult<Json<SessionResponse>> {
    let pair = JwtKeys::from_ref(state).sign_pair(user.id, &user.username)?;
    let profile_url = state.config.profile_url(&user.username);
    Ok(Json(SessionResponse {
        success: true,
        message: message.to_string(),
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        user: SessionUser::new(user, profile_url),
    }))
}

#[instrument(skip(state, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    ValidJson(mut payload): ValidJson<SignUpRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse>)> {
    payload.normalize();
    services::sign_up(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "User registered successfully. Please verify your account.",
        )),
    ))
}

#[instrument(skip(state))]
pub async fn check_username_unique(
    State(state): State<AppState>,
    Query(q): Query<UsernameQuery>,
) -> AppResult<Json<ApiResponse>> {
    let username = q.username.trim();
    validation::username(username).map_err(|e| {
        warn!(error = %e, "invalid username query");
        e
    })?;

    let body = if services::username_available(&state, username).await? {
        ApiResponse::ok("Username is unique")
    } else {
        ApiResponse::fail("Username is already taken")
    };
    Ok(Json(body))
}

#[instrument(skip(state, payload))]
pub async fn verify_code(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<VerifyCodeRequest>,
) -> AppResult<Json<ApiResponse>> {
    let message = match services::verify_code(&state, &payload).await? {
        Verified::Now => "Account verified successfully",
        Verified::Already => "Account already verified",
    };
    Ok(Json(ApiResponse::ok(message)))
}

#[instrument(skip(state, payload))]
pub async fn sign_in(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<SignInRequest>,
) -> AppResult<Json<SessionResponse>> {
    let user = services::sign_in(&state, &payload).await?;
    session(&state, user, "Signed in successfully")
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RefreshRequest>,
) -> AppResult<Json<SessionResponse>> {
    let claims = JwtKeys::from_ref(&state)
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| {
            warn!(error = %e, "refresh rejected");
            AppError::unauthorized("Invalid or expired refresh token")
        })?;

    let user = state
        .store
        .find_by_id(claims.sub)
        .await?
        .filter(|u| u.is_verified)
        .ok_or_else(|| AppError::unauthorized("User not found"))?;

    session(&state, user, "Session refreshed")
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<SessionUser>> {
    let user = state
        .store
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    let profile_url = state.config.profile_url(&user.username);
    Ok(Json(SessionUser::new(user, profile_url)))
}
