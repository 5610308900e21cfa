use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    store::User,
    validation::{self, Validate},
};

/// Request body for registration.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl SignUpRequest {
    pub fn normalize(&mut self) {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_lowercase();
    }
}

impl Validate for SignUpRequest {
    fn validate(&self) -> Result<(), AppError> {
        validation::username(self.username.trim())?;
        validation::email(&self.email.trim().to_lowercase())?;
        validation::password(&self.password)
    }
}

/// Request body for sign-in; `identifier` is a username or an email.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub identifier: String,
    pub password: String,
}

impl Validate for SignInRequest {
    fn validate(&self) -> Result<(), AppError> {
        validation::required(&self.identifier, "Identifier")?;
        validation::required(&self.password, "Password")
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub username: String,
    pub code: String,
}

impl Validate for VerifyCodeRequest {
    fn validate(&self) -> Result<(), AppError> {
        validation::required(&self.username, "Username")?;
        validation::code(self.code.trim())
    }
}

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

impl Validate for RefreshRequest {
    fn validate(&self) -> Result<(), AppError> {
        validation::required(&self.refresh_token, "Refresh token")
    }
}

/// The signed-in user as the client sees it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_verified: bool,
    pub is_accepting_messages: bool,
    pub profile_url: String,
}

impl SessionUser {
    pub fn new(user: User, profile_url: String) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_verified: user.is_verified,
            is_accepting_messages: user.is_accepting_messages,
            profile_url,
        }
    }
}

/// Response returned after sign-in or refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub success: bool,
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
    pub user: SessionUser,
}
