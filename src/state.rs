use std::sync::Arc;

use redb::Database;

use crate::{config::Config, rate_limiter::RateLimits};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub cfg: Arc<Config>,
    pub limits: Arc<RateLimits>,
}
