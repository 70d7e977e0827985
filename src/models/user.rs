use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered caller and the Apollo.io key requests are made with.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub api_key: String,
    /// Result of the most recent key liveness check.
    pub is_active: bool,
    pub last_checked: DateTime<Utc>,
}

impl User {
    /// The stored key with everything but its last four characters hidden.
    pub fn api_key_hint(&self) -> String {
        mask_key(&self.api_key)
    }
}

/// Never log or return a full upstream key.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("****{}", tail)
    } else {
        "****".to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub api_key: String,
}

/// Admin-facing view of a user. The key itself is never serialised.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: i64,
    pub email: String,
    pub api_key_hint: String,
    pub is_active: bool,
    pub last_checked: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            api_key_hint: u.api_key_hint(),
            is_active: u.is_active,
            last_checked: u.last_checked,
        }
    }
}
