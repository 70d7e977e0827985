use async_trait::async_trait;
use sqlx::PgPool;

use super::UserStore;
use crate::models::user::{NewUser, User};

const USER_COLUMNS: &str = "id, email, api_key, is_active, last_checked";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM user_accounts WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM user_accounts WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn set_activity(&self, id: i64, active: bool) -> anyhow::Result<()> {
        sqlx::query("UPDATE user_accounts SET is_active = $2, last_checked = NOW() WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_user(&self, user: &NewUser) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO user_accounts (email, api_key)
               VALUES ($1, $2)
               ON CONFLICT (email) DO NOTHING
               RETURNING {}"#,
            USER_COLUMNS
        ))
        .bind(&user.email)
        .bind(&user.api_key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM user_accounts ORDER BY id ASC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update_api_key(&self, id: i64, api_key: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE user_accounts SET api_key = $2 WHERE id = $1")
            .bind(id)
            .bind(api_key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
