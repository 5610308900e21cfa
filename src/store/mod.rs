use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

#[cfg(test)]
pub mod memory;
pub mod postgres;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string
    #[serde(skip_serializing)]
    pub verify_code: Option<String>,
    #[serde(skip_serializing)]
    pub verify_code_expiry: Option<OffsetDateTime>,
    pub is_verified: bool,
    pub is_accepting_messages: bool,
    pub created_at: OffsetDateTime,
}

/// A message left on a user's profile. Owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Fields written when a user registers (or re-registers before verifying).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub verify_code: String,
    pub verify_code_expiry: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

impl UniqueField {
    pub fn label(self) -> &'static str {
        match self {
            UniqueField::Username => "Username",
            UniqueField::Email => "Email",
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{} already exists", .0.label())]
    Duplicate(UniqueField),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Looks a user up by username or email, whichever matches.
    async fn find_by_identifier(&self, identifier: &str) -> StoreResult<Option<User>>;

    async fn create(&self, new: NewUser) -> StoreResult<User>;
    /// Overwrites the credentials and code of an unverified user.
    async fn refresh_registration(&self, id: Uuid, new: NewUser) -> StoreResult<User>;
    /// Marks the user verified and clears the code. Returns false if no such user.
    async fn mark_verified(&self, id: Uuid) -> StoreResult<bool>;
    async fn set_accepting_messages(&self, id: Uuid, accepting: bool)
        -> StoreResult<Option<User>>;

    async fn add_message(&self, user_id: Uuid, content: &str) -> StoreResult<Message>;
    /// All messages of a user, newest first.
    async fn list_messages(&self, user_id: Uuid) -> StoreResult<Vec<Message>>;
    /// Removes one message of one user. Returns whether anything was removed.
    async fn delete_message(&self, user_id: Uuid, message_id: Uuid) -> StoreResult<bool>;
}
