use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::auth::password;
use crate::database::repository::{NewUser, UserRepository};
use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /api/auth/register - Create a new (non-admin) account
pub async fn register_post(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> ApiResult<MessageResponse> {
    validate_signup(&payload)?;

    let users = UserRepository::new(state.pool.clone());
    if users.exists_by_email(&payload.email).await? {
        return Err(ApiError::bad_request("Error: Email is already taken!"));
    }

    let password_hash = password::hash_password(&payload.password).map_err(|e| {
        tracing::error!("Password hashing failed: {}", e);
        ApiError::internal_server_error("An error occurred while processing your request")
    })?;

    let user = users
        .create(NewUser {
            email: payload.email,
            first_name: payload.first_name,
            last_name: payload.last_name,
            password_hash,
            admin: false,
        })
        .await?;

    tracing::info!("Registered account {}", user.email);

    Ok(ApiResponse::success(MessageResponse {
        message: "User registered successfully!".to_string(),
    }))
}

fn validate_signup(payload: &SignupRequest) -> Result<(), ApiError> {
    let mut field_errors = HashMap::new();

    if payload.email.trim().is_empty() {
        field_errors.insert("email".to_string(), "Email must not be blank".to_string());
    } else if payload.email.chars().count() > 50 {
        field_errors.insert(
            "email".to_string(),
            "Email must be at most 50 characters".to_string(),
        );
    } else if !is_valid_email(&payload.email) {
        field_errors.insert("email".to_string(), "Invalid email format".to_string());
    }

    for (field, value) in [
        ("first_name", &payload.first_name),
        ("last_name", &payload.last_name),
    ] {
        let len = value.trim().chars().count();
        if !(3..=20).contains(&len) {
            field_errors.insert(
                field.to_string(),
                "Must be between 3 and 20 characters".to_string(),
            );
        }
    }

    let password_len = payload.password.chars().count();
    if !(6..=40).contains(&password_len) {
        field_errors.insert(
            "password".to_string(),
            "Password must be between 6 and 40 characters".to_string(),
        );
    }

    if field_errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_error(
            "Invalid signup payload",
            Some(field_errors),
        ))
    }
}

fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> SignupRequest {
        SignupRequest {
            email: "newuser@example.com".to_string(),
            first_name: "New".to_string(),
            last_name: "User".to_string(),
            password: "newpass123".to_string(),
        }
    }

    #[test]
    fn valid_signup_passes() {
        assert!(validate_signup(&valid_payload()).is_ok());
    }

    #[test]
    fn invalid_email_is_rejected() {
        for bad in ["", "invalid-email", "missing@tld", "@example.com", "a@b@c.com"] {
            let mut payload = valid_payload();
            payload.email = bad.to_string();
            assert!(validate_signup(&payload).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn email_over_50_characters_is_rejected() {
        let mut payload = valid_payload();
        payload.email = format!("{}@example.com", "a".repeat(50));
        assert!(validate_signup(&payload).is_err());
    }

    #[test]
    fn name_length_bounds_are_enforced() {
        let mut payload = valid_payload();
        payload.first_name = "A".to_string();
        assert!(validate_signup(&payload).is_err());

        let mut payload = valid_payload();
        payload.last_name = "x".repeat(21);
        assert!(validate_signup(&payload).is_err());

        let mut payload = valid_payload();
        payload.first_name = "Ann".to_string();
        assert!(validate_signup(&payload).is_ok());
    }

    #[test]
    fn password_length_bounds_are_enforced() {
        let mut payload = valid_payload();
        payload.password = "123".to_string();
        assert!(validate_signup(&payload).is_err());

        let mut payload = valid_payload();
        payload.password = "x".repeat(41);
        assert!(validate_signup(&payload).is_err());

        let mut payload = valid_payload();
        payload.password = "123456".to_string();
        assert!(validate_signup(&payload).is_ok());
    }
}
