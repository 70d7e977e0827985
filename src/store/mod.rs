pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::models::user::{NewUser, User};

/// Persistence for registered users and their Apollo.io keys.
/// Implementations: PgStore (Postgres), MemoryStore (tests and local dev).
///
/// Email lookups are exact-match; case handling follows the backend
/// (the Postgres default collation, byte equality in memory).
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>>;

    /// Record a liveness verdict and refresh `last_checked`. Written immediately.
    async fn set_activity(&self, id: i64, active: bool) -> anyhow::Result<()>;

    /// Register a user. Returns `None` when the email is already taken.
    async fn insert_user(&self, user: &NewUser) -> anyhow::Result<Option<User>>;

    async fn list_users(&self) -> anyhow::Result<Vec<User>>;

    /// Replace the stored key. Returns false if no such user.
    async fn update_api_key(&self, id: i64, api_key: &str) -> anyhow::Result<bool>;

    /// Cheap round trip used by the readiness probe.
    async fn ping(&self) -> anyhow::Result<()>;
}
