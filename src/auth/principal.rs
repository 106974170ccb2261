use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::user::User;
use crate::database::repository::UserRepository;

/// Authenticated identity attached to a request. A projection of the
/// account row minus the password hash, which never crosses this boundary.
#[derive(Clone, Debug)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub admin: bool,
}

impl From<User> for Principal {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            admin: user.admin,
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no account for identifier")]
    NotFound,
    #[error("account lookup failed: {0}")]
    Store(String),
}

/// Lookup seam between the authentication filter and the account store.
/// The filter depends on this trait so it can be exercised without a
/// database; the server installs the Postgres implementation.
#[async_trait]
pub trait PrincipalResolver: Send + Sync {
    /// Exact-match lookup by login identifier, fresh on every call; no
    /// decoded-token cache sits in front of the store.
    async fn resolve(&self, email: &str) -> Result<Principal, ResolveError>;
}

pub struct PgPrincipalResolver {
    users: UserRepository,
}

impl PgPrincipalResolver {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }
}

#[async_trait]
impl PrincipalResolver for PgPrincipalResolver {
    async fn resolve(&self, email: &str) -> Result<Principal, ResolveError> {
        let user = self
            .users
            .find_by_email(email)
            .await
            .map_err(|e| ResolveError::Store(e.to_string()))?;

        user.map(Principal::from).ok_or(ResolveError::NotFound)
    }
}
