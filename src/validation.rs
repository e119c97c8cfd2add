use std::sync::LazyLock;

use regex::Regex;

use crate::{
    error::AppError,
    models::{LoginRequest, RegisterRequest},
};

static HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("handle pattern"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

pub fn validate_register(req: &RegisterRequest) -> Result<(), AppError> {
    let mut errors = Vec::new();

    check_handle(&req.username, "Username", &mut errors);

    if !EMAIL_RE.is_match(&req.email) {
        errors.push("Invalid email".to_string());
    } else if req.email.chars().count() > 100 {
        errors.push("Email too long".to_string());
    }

    let password_len = req.password.chars().count();
    if password_len < 8 {
        errors.push("Password must be at least 8 characters".to_string());
    } else if password_len > 100 {
        errors.push("Password too long".to_string());
    }
    let has_lower = req.password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = req.password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = req.password.chars().any(|c| c.is_ascii_digit());
    if !(has_lower && has_upper && has_digit) {
        errors.push(
            "Password must contain at least one lowercase letter, one uppercase letter and one digit"
                .to_string(),
        );
    }

    check_handle(&req.cash_tap_user, "CashTap user", &mut errors);

    finish(errors)
}

pub fn validate_login(req: &LoginRequest) -> Result<(), AppError> {
    let mut errors = Vec::new();

    if req.email.is_empty() {
        errors.push("Email or username is required".to_string());
    } else if req.email.chars().count() > 100 {
        errors.push("Email or username too long".to_string());
    }

    if req.password.is_empty() {
        errors.push("Password is required".to_string());
    } else if req.password.chars().count() > 100 {
        errors.push("Password too long".to_string());
    }

    finish(errors)
}

fn check_handle(value: &str, label: &str, errors: &mut Vec<String>) {
    let len = value.chars().count();
    if len < 3 {
        errors.push(format!("{label} must be at least 3 characters"));
    } else if len > 20 {
        errors.push(format!("{label} must be at most 20 characters"));
    }
    if !HANDLE_RE.is_match(value) {
        errors.push(format!(
            "{label} may only contain letters, digits and underscore"
        ));
    }
}

fn finish(errors: Vec<String>) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::bad_request(format!(
            "Validation failed: {}",
            errors.join(", ")
        )))
    }
}
