//! Login, registration and logout.

use reqwest::StatusCode;

use crate::api::ApiError;
use crate::api::backend::{Client, Credentials};
use crate::notice::Notifier;
use crate::session::Session;

pub const MIN_PASSWORD_LEN: usize = 6;

const UNKNOWN_ERROR: &str = "An unknown error has occurred. Try again later.";

pub fn login_error_message(e: &ApiError) -> String {
    match e.status() {
        Some(StatusCode::UNAUTHORIZED) => "Email or password are incorrect.".into(),
        Some(StatusCode::FORBIDDEN) => "Can't login while logged in.".into(),
        _ => UNKNOWN_ERROR.into(),
    }
}

pub fn register_error_message(e: &ApiError) -> String {
    match e {
        ApiError::Validation(message) => message.clone(),
        _ => match e.status() {
            Some(StatusCode::CONFLICT) => "Email already taken. Please use another.".into(),
            Some(StatusCode::FORBIDDEN) => "Cannot create account while logged in.".into(),
            _ => UNKNOWN_ERROR.into(),
        },
    }
}

/// Checks a registration form before it is sent.
pub fn validate_registration(
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<Credentials, ApiError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ApiError::Validation("Email can't be empty".into()));
    }
    if !email.contains('@') {
        return Err(ApiError::Validation("Invalid email format".into()));
    }
    if password.is_empty() {
        return Err(ApiError::Validation("Password can't be empty".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    if password != confirm {
        return Err(ApiError::Validation("Passwords don't match".into()));
    }

    Ok(Credentials {
        email: email.to_string(),
        password: password.to_string(),
    })
}

pub async fn login(
    client: &Client,
    notices: &Notifier,
    credentials: &Credentials,
) -> Result<Session, ApiError> {
    match client.login(credentials).await {
        Ok(_) => {
            notices.success("Logged in successfully");
            Ok(client.session())
        }
        Err(e) => {
            log::warn!("login for {} failed: {e}", credentials.email);
            notices.error(login_error_message(&e));
            Err(e)
        }
    }
}

pub async fn register(
    client: &Client,
    notices: &Notifier,
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<(), ApiError> {
    let result = match validate_registration(email, password, confirm) {
        Ok(credentials) => client.register(&credentials).await.map(|_| ()),
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            notices.success("Account created successfully");
            Ok(())
        }
        Err(e) => {
            notices.error(register_error_message(&e));
            Err(e)
        }
    }
}

pub async fn logout(client: &Client, notices: &Notifier) -> Result<(), ApiError> {
    client.logout().await.map(|_| ()).inspect_err(|e| {
        log::warn!("logout failed: {e}");
        notices.error(UNKNOWN_ERROR);
    })
}
