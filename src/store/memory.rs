use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{Message, NewUser, StoreError, StoreResult, UniqueField, User, UserStore};

struct Entry {
    user: User,
    messages: Vec<Message>, // insertion order
}

/// Process-local store used by the router tests.
#[derive(Default)]
pub struct InMemoryUserStore {
    entries: Mutex<HashMap<Uuid, Entry>>,
}

impl InMemoryUserStore {
    fn with_entries<R>(&self, f: impl FnOnce(&mut HashMap<Uuid, Entry>) -> R) -> R {
        let mut guard = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut guard)
    }

    fn check_unique(
        entries: &HashMap<Uuid, Entry>,
        except: Option<Uuid>,
        username: &str,
        email: &str,
    ) -> StoreResult<()> {
        for e in entries.values().filter(|e| Some(e.user.id) != except) {
            if e.user.username == username {
                return Err(StoreError::Duplicate(UniqueField::Username));
            }
            if e.user.email == email {
                return Err(StoreError::Duplicate(UniqueField::Email));
            }
        }
        Ok(())
    }

    fn find(&self, pred: impl Fn(&User) -> bool) -> Option<User> {
        self.with_entries(|entries| {
            entries
                .values()
                .find(|e| pred(&e.user))
                .map(|e| e.user.clone())
        })
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.find(|u| u.id == id))
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.find(|u| u.username == username))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.find(|u| u.email == email))
    }

    async fn find_by_identifier(&self, identifier: &str) -> StoreResult<Option<User>> {
        let lowered = identifier.to_lowercase();
        Ok(self.find(|u| u.username == identifier || u.email == lowered))
    }

    async fn create(&self, new: NewUser) -> StoreResult<User> {
        self.with_entries(|entries| {
            Self::check_unique(entries, None, &new.username, &new.email)?;
            let user = User {
                id: Uuid::new_v4(),
                username: new.username,
                email: new.email,
                password_hash: new.password_hash,
                verify_code: Some(new.verify_code),
                verify_code_expiry: Some(new.verify_code_expiry),
                is_verified: false,
                is_accepting_messages: true,
                created_at: OffsetDateTime::now_utc(),
            };
            entries.insert(
                user.id,
                Entry {
                    user: user.clone(),
                    messages: Vec::new(),
                },
            );
            Ok(user)
        })
    }

    async fn refresh_registration(&self, id: Uuid, new: NewUser) -> StoreResult<User> {
        self.with_entries(|entries| {
            Self::check_unique(entries, Some(id), &new.username, &new.email)?;
            let entry = entries
                .get_mut(&id)
                .filter(|e| !e.user.is_verified)
                .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
            entry.user.username = new.username;
            entry.user.password_hash = new.password_hash;
            entry.user.verify_code = Some(new.verify_code);
            entry.user.verify_code_expiry = Some(new.verify_code_expiry);
            Ok(entry.user.clone())
        })
    }

    async fn mark_verified(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.with_entries(|entries| match entries.get_mut(&id) {
            Some(e) => {
                e.user.is_verified = true;
                e.user.verify_code = None;
                e.user.verify_code_expiry = None;
                true
            }
            None => false,
        }))
    }

    async fn set_accepting_messages(
        &self,
        id: Uuid,
        accepting: bool,
    ) -> StoreResult<Option<User>> {
        Ok(self.with_entries(|entries| {
            entries.get_mut(&id).map(|e| {
                e.user.is_accepting_messages = accepting;
                e.user.clone()
            })
        }))
    }

    async fn add_message(&self, user_id: Uuid, content: &str) -> StoreResult<Message> {
        self.with_entries(|entries| {
            let entry = entries
                .get_mut(&user_id)
                .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
            let msg = Message {
                id: Uuid::new_v4(),
                content: content.to_string(),
                created_at: OffsetDateTime::now_utc(),
            };
            entry.messages.push(msg.clone());
            Ok(msg)
        })
    }

    async fn list_messages(&self, user_id: Uuid) -> StoreResult<Vec<Message>> {
        Ok(self.with_entries(|entries| {
            let mut out: Vec<Message> = entries
                .get(&user_id)
                .map(|e| e.messages.iter().rev().cloned().collect())
                .unwrap_or_default();
            // stable: equal timestamps keep newest-inserted first
            out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            out
        }))
    }

    async fn delete_message(&self, user_id: Uuid, message_id: Uuid) -> StoreResult<bool> {
        Ok(self.with_entries(|entries| {
            let Some(entry) = entries.get_mut(&user_id) else {
                return false;
            };
            let before = entry.messages.len();
            entry.messages.retain(|m| m.id != message_id);
            entry.messages.len() != before
        }))
    }
}
