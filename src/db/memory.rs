//! In-memory user repository for tests and local experiments.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::repository::{StoreError, UserRepository};
use super::user::{NewUser, User, UserUpdate};

#[derive(Default)]
struct Arena {
    next_id: i64,
    users: BTreeMap<i64, User>,
}

/// User records keyed by id. Nothing is persisted.
#[derive(Default)]
pub struct MemoryUserRepository {
    inner: RwLock<Arena>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn email_taken(arena: &Arena, email: &str, except: Option<i64>) -> bool {
        arena
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(email) && Some(u.id) != except)
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn all(&self) -> Result<Vec<User>, StoreError> {
        let arena = self.inner.read().await;
        let mut users: Vec<User> = arena.users.values().cloned().collect();
        users.sort_by(|a, b| a.last_name.cmp(&b.last_name));
        Ok(users)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let arena = self.inner.read().await;
        Ok(arena
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<i64, StoreError> {
        let mut arena = self.inner.write().await;
        if Self::email_taken(&arena, &user.email, None) {
            return Err(StoreError::DuplicateEmail);
        }

        arena.next_id += 1;
        let id = arena.next_id;
        let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        arena.users.insert(
            id,
            User {
                id,
                first_name: user.first_name,
                last_name: user.last_name,
                email: user.email,
                password: user.password_hash,
                is_admin: user.is_admin,
                created_at: now.clone(),
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn update(&self, user: &UserUpdate) -> Result<bool, StoreError> {
        let mut arena = self.inner.write().await;
        if Self::email_taken(&arena, &user.email, Some(user.id)) {
            return Err(StoreError::DuplicateEmail);
        }

        let Some(existing) = arena.users.get_mut(&user.id) else {
            return Ok(false);
        };
        existing.first_name = user.first_name.clone();
        existing.last_name = user.last_name.clone();
        existing.email = user.email.clone();
        existing.is_admin = user.is_admin;
        existing.updated_at = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        Ok(true)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.users.remove(&id).is_some())
    }

    async fn reset_password(&self, id: i64, password_hash: &str) -> Result<bool, StoreError> {
        let mut arena = self.inner.write().await;
        match arena.users.get_mut(&id) {
            Some(user) => {
                user.password = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
