use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use tracing::{error, info};

use crate::{
    accounts::{NewUser, authenticate, create_user},
    db::get_user,
    error::AppError,
    gate::{ClientId, with_rate_limit},
    models::{LoginRequest, PublicProfile, RegisterRequest, RegisterResponse, Role, UserProfile},
    state::AppState,
    validation::{validate_login, validate_register},
};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

// Register and login take the raw body so a throttled client is turned away
// before anything is parsed.

pub async fn register(State(state): State<AppState>, client: ClientId, body: Bytes) -> Response {
    with_rate_limit(&state.limits.strict, &client, || async {
        let result = register_user(&state, &body).await;
        log_server_error("registration", &result);
        result.into_response()
    })
    .await
}

pub async fn login(State(state): State<AppState>, client: ClientId, body: Bytes) -> Response {
    with_rate_limit(&state.limits.auth, &client, || async {
        let result = login_user(&state, &body).await;
        log_server_error("login", &result);
        result.into_response()
    })
    .await
}

pub async fn user_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PublicProfile>, AppError> {
    match get_user(&state.db, &id)? {
        Some(user) => Ok(Json(user.into())),
        None => Err(AppError::new(StatusCode::NOT_FOUND, "User not found")),
    }
}

async fn register_user(
    state: &AppState,
    body: &[u8],
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let req: RegisterRequest = parse_json(body)?;
    validate_register(&req)?;

    let user = create_user(
        &state.db,
        state.cfg.bcrypt_cost,
        NewUser {
            username: req.username,
            email: req.email,
            password: req.password,
            cash_tap_user: req.cash_tap_user,
            role: Role::User,
        },
    )
    .await?;
    info!(user_id = %user.id, username = %user.username, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created".to_string(),
            user_id: user.id,
        }),
    ))
}

async fn login_user(state: &AppState, body: &[u8]) -> Result<Json<UserProfile>, AppError> {
    let req: LoginRequest = parse_json(body)?;
    if validate_login(&req).is_err() {
        return Err(AppError::new(StatusCode::UNAUTHORIZED, "Invalid credentials"));
    }

    let user = authenticate(&state.db, &req.email, &req.password).await?;
    info!(user_id = %user.id, "login succeeded");
    Ok(Json(user.into()))
}

fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|_| AppError::bad_request("Invalid JSON body"))
}

fn log_server_error<T>(action: &str, result: &Result<T, AppError>) {
    if let Err(err) = result {
        if err.status.is_server_error() {
            error!("{action} failed: {err}");
        }
    }
}
