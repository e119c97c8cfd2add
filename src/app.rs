use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::{
    gate::api_rate_limit,
    handlers::{health, login, register, user_profile},
    state::AppState,
};

pub fn router(state: AppState) -> anyhow::Result<Router> {
    let cors = if state.cfg.cors_allow_any {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins = state
            .cfg
            .cors_origins
            .iter()
            .map(|origin| HeaderValue::from_str(origin))
            .collect::<Result<Vec<_>, _>>()?;
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let api = Router::new()
        .route("/api/users/:id", get(user_profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), api_rate_limit));

    Ok(Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .merge(api)
        .layer(cors)
        .with_state(state))
}
