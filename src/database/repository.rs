use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::session::Session;
use crate::database::models::teacher::Teacher;
use crate::database::models::user::User;

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, password_hash, admin, created_at, updated_at";
const SESSION_COLUMNS: &str =
    "id, name, description, scheduled_at, teacher_id, created_at, updated_at";

/// Insert payload for a new account; the password arrives here already
/// hashed.
#[derive(Debug)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub admin: bool,
}

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Exact-match lookup, as stored; no case normalization.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn exists_by_email(&self, email: &str) -> Result<bool, DatabaseError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn create(&self, new_user: NewUser) -> Result<User, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, email, first_name, last_name, password_hash, admin) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.password_hash)
        .bind(new_user.admin)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

pub struct TeacherRepository {
    pool: PgPool,
}

impl TeacherRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self) -> Result<Vec<Teacher>, DatabaseError> {
        let teachers = sqlx::query_as::<_, Teacher>(
            "SELECT id, first_name, last_name, created_at, updated_at \
             FROM teachers ORDER BY last_name, first_name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(teachers)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Teacher>, DatabaseError> {
        let teacher = sqlx::query_as::<_, Teacher>(
            "SELECT id, first_name, last_name, created_at, updated_at \
             FROM teachers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(teacher)
    }
}

/// Create/update payload for a session. Both operations take the full
/// field set, mirroring the PUT semantics of the API.
#[derive(Debug)]
pub struct SessionChanges {
    pub name: String,
    pub description: String,
    pub scheduled_at: DateTime<Utc>,
    pub teacher_id: Uuid,
}

pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self) -> Result<Vec<Session>, DatabaseError> {
        let sessions = sqlx::query_as::<_, Session>(&format!(
            "SELECT {} FROM sessions ORDER BY scheduled_at",
            SESSION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>, DatabaseError> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {} FROM sessions WHERE id = $1",
            SESSION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    pub async fn create(&self, changes: SessionChanges) -> Result<Session, DatabaseError> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "INSERT INTO sessions (id, name, description, scheduled_at, teacher_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {}",
            SESSION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.scheduled_at)
        .bind(changes.teacher_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    pub async fn update(
        &self,
        id: Uuid,
        changes: SessionChanges,
    ) -> Result<Option<Session>, DatabaseError> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "UPDATE sessions \
             SET name = $2, description = $3, scheduled_at = $4, teacher_id = $5, updated_at = now() \
             WHERE id = $1 \
             RETURNING {}",
            SESSION_COLUMNS
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.scheduled_at)
        .bind(changes.teacher_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Participant ids for one session, insertion order.
    pub async fn participant_ids(&self, session_id: Uuid) -> Result<Vec<Uuid>, DatabaseError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM session_participants \
             WHERE session_id = $1 ORDER BY created_at",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    pub async fn is_participant(
        &self,
        session_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, DatabaseError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM session_participants \
             WHERE session_id = $1 AND user_id = $2)",
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn add_participant(
        &self,
        session_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), DatabaseError> {
        sqlx::query("INSERT INTO session_participants (session_id, user_id) VALUES ($1, $2)")
            .bind(session_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn remove_participant(
        &self,
        session_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "DELETE FROM session_participants WHERE session_id = $1 AND user_id = $2",
        )
        .bind(session_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
