use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::session::Session;
use crate::database::models::teacher::Teacher;
use crate::database::models::user::User;

/// Account wire view. Built from the row, never carries the hash.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            admin: user.admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TeacherDto {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Teacher> for TeacherDto {
    fn from(teacher: Teacher) -> Self {
        Self {
            id: teacher.id,
            first_name: teacher.first_name,
            last_name: teacher.last_name,
            created_at: teacher.created_at,
            updated_at: teacher.updated_at,
        }
    }
}

/// Session wire view: the row plus its participant user ids.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionDto {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "date")]
    pub scheduled_at: DateTime<Utc>,
    pub description: String,
    pub teacher_id: Uuid,
    pub users: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionDto {
    pub fn from_session(session: Session, users: Vec<Uuid>) -> Self {
        Self {
            id: session.id,
            name: session.name,
            scheduled_at: session.scheduled_at,
            description: session.description,
            teacher_id: session.teacher_id,
            users,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}
