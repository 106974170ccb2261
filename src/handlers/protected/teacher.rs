use axum::extract::{Path, State};
use uuid::Uuid;

use crate::api::dto::TeacherDto;
use crate::auth::Principal;
use crate::database::repository::TeacherRepository;
use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/teacher
pub async fn teacher_list(
    State(state): State<AppState>,
    _principal: Principal,
) -> ApiResult<Vec<TeacherDto>> {
    let teachers = TeacherRepository::new(state.pool.clone()).find_all().await?;

    Ok(ApiResponse::success(
        teachers.into_iter().map(TeacherDto::from).collect(),
    ))
}

/// GET /api/teacher/:id
pub async fn teacher_get(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<TeacherDto> {
    let teacher = TeacherRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Teacher not found"))?;

    Ok(ApiResponse::success(TeacherDto::from(teacher)))
}
