// In-memory user store for tests and `serve --in-memory`.
// All data is lost on restart.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::UserStore;
use crate::models::user::{NewUser, User};

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<i64, User>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user directly, bypassing the duplicate check. Returns the stored row.
    pub fn seed(&self, email: &str, api_key: &str) -> User {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let user = User {
            id,
            email: email.to_string(),
            api_key: api_key.to_string(),
            is_active: true,
            last_checked: Utc::now(),
        };
        self.users.insert(id, user.clone());
        user
    }

    pub fn remove(&self, id: i64) -> Option<User> {
        self.users.remove(&id).map(|(_, u)| u)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.value().clone()))
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn set_activity(&self, id: i64, active: bool) -> anyhow::Result<()> {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.is_active = active;
            user.last_checked = Utc::now();
        }
        Ok(())
    }

    async fn insert_user(&self, user: &NewUser) -> anyhow::Result<Option<User>> {
        if self.find_by_email(&user.email).await?.is_some() {
            return Ok(None);
        }
        Ok(Some(self.seed(&user.email, &user.api_key)))
    }

    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn update_api_key(&self, id: i64, api_key: &str) -> anyhow::Result<bool> {
        match self.users.get_mut(&id) {
            Some(mut user) => {
                user.api_key = api_key.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
