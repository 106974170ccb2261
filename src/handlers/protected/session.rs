use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::api::dto::SessionDto;
use crate::auth::Principal;
use crate::database::models::session::Session;
use crate::database::repository::{
    SessionChanges, SessionRepository, TeacherRepository, UserRepository,
};
use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Create/update payload. Fields are optional at the serde layer so that
/// missing and null values surface as field validation errors rather than
/// a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub name: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub teacher_id: Option<Uuid>,
}

/// GET /api/session
pub async fn session_list(
    State(state): State<AppState>,
    _principal: Principal,
) -> ApiResult<Vec<SessionDto>> {
    let sessions = SessionRepository::new(state.pool.clone());

    let mut dtos = Vec::new();
    for session in sessions.find_all().await? {
        let users = sessions.participant_ids(session.id).await?;
        dtos.push(SessionDto::from_session(session, users));
    }

    Ok(ApiResponse::success(dtos))
}

/// GET /api/session/:id
pub async fn session_get(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<SessionDto> {
    let sessions = SessionRepository::new(state.pool.clone());
    let session = find_session(&sessions, id).await?;
    let users = sessions.participant_ids(session.id).await?;

    Ok(ApiResponse::success(SessionDto::from_session(
        session, users,
    )))
}

/// POST /api/session
pub async fn session_post(
    State(state): State<AppState>,
    _principal: Principal,
    Json(payload): Json<SessionRequest>,
) -> ApiResult<SessionDto> {
    let changes = validate_session(payload)?;
    ensure_teacher_exists(&state, changes.teacher_id).await?;

    let session = SessionRepository::new(state.pool.clone())
        .create(changes)
        .await?;
    tracing::info!("Created session {} ({})", session.name, session.id);

    Ok(ApiResponse::success(SessionDto::from_session(
        session,
        Vec::new(),
    )))
}

/// PUT /api/session/:id
pub async fn session_put(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<Uuid>,
    Json(payload): Json<SessionRequest>,
) -> ApiResult<SessionDto> {
    let changes = validate_session(payload)?;
    ensure_teacher_exists(&state, changes.teacher_id).await?;

    let sessions = SessionRepository::new(state.pool.clone());
    let session = sessions
        .update(id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("Session not found"))?;
    let users = sessions.participant_ids(session.id).await?;

    Ok(ApiResponse::success(SessionDto::from_session(
        session, users,
    )))
}

/// DELETE /api/session/:id
pub async fn session_delete(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    let deleted = SessionRepository::new(state.pool.clone()).delete(id).await?;
    if !deleted {
        return Err(ApiError::not_found("Session not found"));
    }

    tracing::info!("Deleted session {}", id);
    Ok(ApiResponse::success(()))
}

/// POST /api/session/:id/participate/:user_id - Book a user onto a session
pub async fn participate_post(
    State(state): State<AppState>,
    _principal: Principal,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<()> {
    let sessions = SessionRepository::new(state.pool.clone());
    let session = find_session(&sessions, id).await?;

    UserRepository::new(state.pool.clone())
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if sessions.is_participant(session.id, user_id).await? {
        return Err(ApiError::bad_request(
            "User already participates in this session",
        ));
    }

    sessions.add_participant(session.id, user_id).await?;
    tracing::debug!("User {} booked onto session {}", user_id, session.id);

    Ok(ApiResponse::success(()))
}

/// DELETE /api/session/:id/participate/:user_id - Cancel a booking
pub async fn participate_delete(
    State(state): State<AppState>,
    _principal: Principal,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<()> {
    let sessions = SessionRepository::new(state.pool.clone());
    let session = find_session(&sessions, id).await?;

    if !sessions.is_participant(session.id, user_id).await? {
        return Err(ApiError::bad_request(
            "User does not participate in this session",
        ));
    }

    sessions.remove_participant(session.id, user_id).await?;
    tracing::debug!("User {} left session {}", user_id, session.id);

    Ok(ApiResponse::success(()))
}

async fn find_session(sessions: &SessionRepository, id: Uuid) -> Result<Session, ApiError> {
    Ok(sessions
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Session not found"))?)
}

async fn ensure_teacher_exists(state: &AppState, teacher_id: Uuid) -> Result<(), ApiError> {
    TeacherRepository::new(state.pool.clone())
        .find_by_id(teacher_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Teacher not found"))?;
    Ok(())
}

fn validate_session(payload: SessionRequest) -> Result<SessionChanges, ApiError> {
    let mut field_errors = HashMap::new();

    let name = payload.name.unwrap_or_default();
    if name.trim().is_empty() {
        field_errors.insert("name".to_string(), "Name must not be blank".to_string());
    } else if name.chars().count() > 50 {
        field_errors.insert(
            "name".to_string(),
            "Name must be at most 50 characters".to_string(),
        );
    }

    let description = payload.description.unwrap_or_default();
    if description.is_empty() {
        field_errors.insert(
            "description".to_string(),
            "Description is required".to_string(),
        );
    } else if description.chars().count() > 2500 {
        field_errors.insert(
            "description".to_string(),
            "Description must be at most 2500 characters".to_string(),
        );
    }

    if payload.date.is_none() {
        field_errors.insert("date".to_string(), "Date is required".to_string());
    }
    if payload.teacher_id.is_none() {
        field_errors.insert(
            "teacher_id".to_string(),
            "Teacher id is required".to_string(),
        );
    }

    match (payload.date, payload.teacher_id) {
        (Some(scheduled_at), Some(teacher_id)) if field_errors.is_empty() => Ok(SessionChanges {
            name,
            description,
            scheduled_at,
            teacher_id,
        }),
        _ => Err(ApiError::validation_error(
            "Invalid session payload",
            Some(field_errors),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> SessionRequest {
        SessionRequest {
            name: Some("Morning Flow".to_string()),
            date: Some(Utc::now()),
            description: Some("Vinyasa basics".to_string()),
            teacher_id: Some(Uuid::new_v4()),
        }
    }

    #[test]
    fn valid_payload_maps_to_changes() {
        let changes = validate_session(valid_payload()).unwrap();
        assert_eq!(changes.name, "Morning Flow");
        assert_eq!(changes.description, "Vinyasa basics");
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut payload = valid_payload();
        payload.name = Some("   ".to_string());
        assert!(validate_session(payload).is_err());

        let mut payload = valid_payload();
        payload.name = None;
        assert!(validate_session(payload).is_err());
    }

    #[test]
    fn missing_date_and_teacher_are_rejected() {
        let mut payload = valid_payload();
        payload.date = None;
        assert!(validate_session(payload).is_err());

        let mut payload = valid_payload();
        payload.teacher_id = None;
        assert!(validate_session(payload).is_err());
    }

    #[test]
    fn oversized_description_is_rejected() {
        let mut payload = valid_payload();
        payload.description = Some("x".repeat(2501));
        assert!(validate_session(payload).is_err());

        let mut payload = valid_payload();
        payload.description = Some("x".repeat(2500));
        assert!(validate_session(payload).is_ok());
    }
}
