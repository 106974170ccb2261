use axum::extract::{Path, State};
use uuid::Uuid;

use crate::api::dto::UserDto;
use crate::auth::Principal;
use crate::database::repository::UserRepository;
use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/user/:id
pub async fn user_get(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<UserDto> {
    let user = UserRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::success(UserDto::from(user)))
}

/// DELETE /api/user/:id - Accounts can only be deleted by their owner.
pub async fn user_delete(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    let users = UserRepository::new(state.pool.clone());

    let user = users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if user.email != principal.email {
        return Err(ApiError::unauthorized(
            "You can only delete your own account",
        ));
    }

    users.delete(id).await?;
    tracing::info!("Deleted account {}", user.email);

    Ok(ApiResponse::success(()))
}
