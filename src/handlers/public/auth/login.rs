use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::api::dto::UserDto;
use crate::auth::password;
use crate::database::repository::UserRepository;
use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
    pub user: UserDto,
}

/// POST /api/auth/login - Authenticate credentials and issue a JWT
///
/// Unknown account and wrong password produce the identical 401 response.
pub async fn login_post(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    validate_login(&payload)?;

    let users = UserRepository::new(state.pool.clone());
    let user = match users.find_by_email(&payload.email).await? {
        Some(user) if password::verify_password(&payload.password, &user.password_hash) => user,
        _ => return Err(ApiError::unauthorized("Bad credentials")),
    };

    let token = state.tokens.issue(&user.email, Utc::now()).map_err(|e| {
        tracing::error!("Failed to issue token: {}", e);
        ApiError::internal_server_error("An error occurred while processing your request")
    })?;

    tracing::debug!("Issued token for {}", user.email);

    Ok(ApiResponse::success(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.ttl().num_seconds(),
        user: UserDto::from(user),
    }))
}

fn validate_login(payload: &LoginRequest) -> Result<(), ApiError> {
    let mut field_errors = HashMap::new();

    if payload.email.trim().is_empty() {
        field_errors.insert("email".to_string(), "Email must not be blank".to_string());
    }
    if payload.password.is_empty() {
        field_errors.insert(
            "password".to_string(),
            "Password must not be blank".to_string(),
        );
    }

    if field_errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_error(
            "Invalid login payload",
            Some(field_errors),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_email_is_rejected() {
        let payload = LoginRequest {
            email: "  ".to_string(),
            password: "password123".to_string(),
        };
        let err = validate_login(&payload).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn blank_password_is_rejected() {
        let payload = LoginRequest {
            email: "yoga@studio.com".to_string(),
            password: String::new(),
        };
        assert!(validate_login(&payload).is_err());
    }

    #[test]
    fn complete_payload_passes() {
        let payload = LoginRequest {
            email: "yoga@studio.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(validate_login(&payload).is_ok());
    }
}
