use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimiterPolicy {
    pub name: &'static str,
    pub window_ms: u64,
    pub max_requests: u32,
    pub message: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum PolicyError {
    ZeroWindow(&'static str),
    ZeroMaxRequests(&'static str),
    WindowTooLarge(&'static str),
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyError::ZeroWindow(name) => write!(f, "{name} policy: window must be > 0 ms"),
            PolicyError::ZeroMaxRequests(name) => {
                write!(f, "{name} policy: max requests must be > 0")
            }
            PolicyError::WindowTooLarge(name) => {
                write!(f, "{name} policy: window must be at most {MAX_WINDOW_MS} ms")
            }
        }
    }
}

impl std::error::Error for PolicyError {}

const FIFTEEN_MINUTES_MS: u64 = 15 * 60 * 1000;
const ONE_MINUTE_MS: u64 = 60 * 1000;
pub const MAX_WINDOW_MS: u64 = 365 * 24 * 60 * 60 * 1000;

impl LimiterPolicy {
    pub fn new(
        name: &'static str,
        window_ms: u64,
        max_requests: u32,
        message: impl Into<String>,
    ) -> Result<Self, PolicyError> {
        if window_ms == 0 {
            return Err(PolicyError::ZeroWindow(name));
        }
        if window_ms > MAX_WINDOW_MS {
            return Err(PolicyError::WindowTooLarge(name));
        }
        if max_requests == 0 {
            return Err(PolicyError::ZeroMaxRequests(name));
        }
        Ok(Self {
            name,
            window_ms,
            max_requests,
            message: message.into(),
        })
    }

    pub fn auth() -> Self {
        Self {
            name: "auth",
            window_ms: FIFTEEN_MINUTES_MS,
            max_requests: 5,
            message: "Too many login attempts, try again in 15 minutes".to_string(),
        }
    }

    pub fn api() -> Self {
        Self {
            name: "api",
            window_ms: FIFTEEN_MINUTES_MS,
            max_requests: 100,
            message: "Too many requests, try again in 15 minutes".to_string(),
        }
    }

    // Registration and other sensitive creates.
    pub fn strict() -> Self {
        Self {
            name: "strict",
            window_ms: ONE_MINUTE_MS,
            max_requests: 10,
            message: "Too many requests, wait 1 minute".to_string(),
        }
    }
}
