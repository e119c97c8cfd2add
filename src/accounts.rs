use axum::http::StatusCode;
use chrono::Utc;
use redb::Database;
use tracing::info;
use uuid::Uuid;

use crate::{
    config::AdminSeed,
    db::{find_by_login, has_admin, insert_user},
    error::AppError,
    models::{Role, StoredUser},
};

pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub cash_tap_user: String,
    pub role: Role,
}

pub async fn create_user(db: &Database, bcrypt_cost: u32, new: NewUser) -> Result<StoredUser, AppError> {
    let password = new.password;
    let password_hash =
        tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt_cost)).await??;

    let user = StoredUser {
        id: Uuid::new_v4().to_string(),
        username: new.username,
        email: new.email,
        password_hash,
        cash_tap_user: new.cash_tap_user,
        role: new.role,
        created_at: Utc::now(),
    };
    insert_user(db, &user)?;
    Ok(user)
}

pub async fn authenticate(db: &Database, login: &str, password: &str) -> Result<StoredUser, AppError> {
    let invalid = || AppError::new(StatusCode::UNAUTHORIZED, "Invalid credentials");

    let user = find_by_login(db, login)?.ok_or_else(invalid)?;
    let password = password.to_string();
    let hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;

    if matches { Ok(user) } else { Err(invalid()) }
}

pub async fn ensure_admin(db: &Database, bcrypt_cost: u32, seed: &AdminSeed) -> Result<(), AppError> {
    if has_admin(db)? {
        info!("admin account already present");
        return Ok(());
    }

    let admin = create_user(
        db,
        bcrypt_cost,
        NewUser {
            username: seed.username.clone(),
            email: seed.email.clone(),
            password: seed.password.clone(),
            cash_tap_user: seed.cash_tap_user.clone(),
            role: Role::Admin,
        },
    )
    .await?;
    info!(username = %admin.username, "admin account created");
    Ok(())
}
