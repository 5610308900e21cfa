use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{Message, NewUser, StoreError, StoreResult, UniqueField, User, UserStore};

const USER_COLUMNS: &str = "id, username, email, password_hash, verify_code, verify_code_expiry, \
                            is_verified, is_accepting_messages, created_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn find_one(&self, filter: &str, value: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {filter}");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }
}

/// Turns a unique-index violation into a typed duplicate error.
fn map_unique(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some("users_email_key") => StoreError::Duplicate(UniqueField::Email),
                _ => StoreError::Duplicate(UniqueField::Username),
            };
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.find_one("username = $1", username).await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.find_one("email = $1", email).await
    }

    async fn find_by_identifier(&self, identifier: &str) -> StoreResult<Option<User>> {
        self.find_one("username = $1 OR email = lower($1)", identifier)
            .await
    }

    async fn create(&self, new: NewUser) -> StoreResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (id, username, email, password_hash, verify_code, verify_code_expiry)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.username)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(&new.verify_code)
            .bind(new.verify_code_expiry)
            .fetch_one(&self.db)
            .await
            .map_err(map_unique)
    }

    async fn refresh_registration(&self, id: Uuid, new: NewUser) -> StoreResult<User> {
        let sql = format!(
            r#"
            UPDATE users
               SET username = $2, password_hash = $3, verify_code = $4, verify_code_expiry = $5
             WHERE id = $1 AND NOT is_verified
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&new.username)
            .bind(&new.password_hash)
            .bind(&new.verify_code)
            .bind(new.verify_code_expiry)
            .fetch_one(&self.db)
            .await
            .map_err(map_unique)
    }

    async fn mark_verified(&self, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET is_verified = TRUE, verify_code = NULL, verify_code_expiry = NULL
             WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn set_accepting_messages(
        &self,
        id: Uuid,
        accepting: bool,
    ) -> StoreResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET is_accepting_messages = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(accepting)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn add_message(&self, user_id: Uuid, content: &str) -> StoreResult<Message> {
        let msg = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (id, user_id, content, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, content, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(content)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&self.db)
        .await?;
        Ok(msg)
    }

    async fn list_messages(&self, user_id: Uuid) -> StoreResult<Vec<Message>> {
        let rows = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, content, created_at
              FROM messages
             WHERE user_id = $1
             ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn delete_message(&self, user_id: Uuid, message_id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM messages WHERE id = $1 AND user_id = $2")
            .bind(message_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
