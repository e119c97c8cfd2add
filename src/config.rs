use std::env;

use crate::policy::LimiterPolicy;

#[derive(Clone)]
pub struct Config {
    pub bind_addr: String,
    pub db_path: String,
    pub cors_allow_any: bool,
    pub cors_origins: Vec<String>,
    pub trust_proxy: bool,
    pub rate_limit_sweep_secs: u64,
    pub bcrypt_cost: u32,
    pub auth_policy: LimiterPolicy,
    pub api_policy: LimiterPolicy,
    pub strict_policy: LimiterPolicy,
    pub admin: Option<AdminSeed>,
}

#[derive(Clone)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub cash_tap_user: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = env_or("BIND_ADDR", "0.0.0.0:3000");
        let db_path = env_or("DB_PATH", "nonpc.redb");
        let cors_raw = env_or("CORS_ORIGINS", "http://localhost:3000");
        let (cors_allow_any, cors_origins) = parse_cors_origins(&cors_raw);
        let trust_proxy = env_or_parse("TRUST_PROXY", false)?;
        let rate_limit_sweep_secs = env_or_parse("RATE_LIMIT_SWEEP_SECS", 60)?;
        let bcrypt_cost = env_or_parse("BCRYPT_COST", 12)?;

        let auth_policy = policy_from_env("AUTH", LimiterPolicy::auth())?;
        let api_policy = policy_from_env("API", LimiterPolicy::api())?;
        let strict_policy = policy_from_env("STRICT", LimiterPolicy::strict())?;

        if !(4..=31).contains(&bcrypt_cost) {
            return Err(anyhow::anyhow!("BCRYPT_COST must be between 4 and 31"));
        }

        let admin = env::var("ADMIN_PASSWORD").ok().map(|password| AdminSeed {
            username: env_or("ADMIN_USERNAME", "admin"),
            email: env_or("ADMIN_EMAIL", "admin@nonpc.network"),
            cash_tap_user: env_or("ADMIN_CASH_TAP_USER", "admin_cashtap"),
            password,
        });

        Ok(Self {
            bind_addr,
            db_path,
            cors_allow_any,
            cors_origins,
            trust_proxy,
            rate_limit_sweep_secs,
            bcrypt_cost,
            auth_policy,
            api_policy,
            strict_policy,
            admin,
        })
    }

    #[cfg(test)]
    pub fn for_tests(db_path: &str) -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            db_path: db_path.to_string(),
            cors_allow_any: true,
            cors_origins: Vec::new(),
            trust_proxy: false,
            rate_limit_sweep_secs: 60,
            bcrypt_cost: 4,
            auth_policy: LimiterPolicy::auth(),
            api_policy: LimiterPolicy::api(),
            strict_policy: LimiterPolicy::strict(),
            admin: None,
        }
    }
}

fn policy_from_env(prefix: &str, defaults: LimiterPolicy) -> anyhow::Result<LimiterPolicy> {
    let window_ms = env_or_parse(&format!("{prefix}_WINDOW_MS"), defaults.window_ms)?;
    let max_requests = env_or_parse(&format!("{prefix}_MAX_REQUESTS"), defaults.max_requests)?;
    let message = env::var(format!("{prefix}_MESSAGE")).unwrap_or(defaults.message);
    Ok(LimiterPolicy::new(
        defaults.name,
        window_ms,
        max_requests,
        message,
    )?)
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => Ok(value.trim().parse()?),
        Err(_) => Ok(default),
    }
}

fn parse_cors_origins(value: &str) -> (bool, Vec<String>) {
    let origins = parse_list(value);

    if origins.iter().any(|item| item == "*") {
        (true, Vec::new())
    } else {
        (false, origins)
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
