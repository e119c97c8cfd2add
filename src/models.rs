use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StoredUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub cash_tap_user: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "cashTapUser")]
    pub cash_tap_user: String,
}

/// `email` carries either an email address or a username.
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub message: String,
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub username: String,
    #[serde(rename = "cashTapUser")]
    pub cash_tap_user: String,
    pub role: Role,
}

impl From<StoredUser> for UserProfile {
    fn from(user: StoredUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            cash_tap_user: user.cash_tap_user,
            role: user.role,
        }
    }
}

// What other callers may see of an account.
#[derive(Serialize, Deserialize, Debug)]
pub struct PublicProfile {
    pub id: String,
    pub username: String,
}

impl From<StoredUser> for PublicProfile {
    fn from(user: StoredUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}
