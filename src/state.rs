use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::{PrincipalResolver, TokenCodec};

/// Shared context handed to the router. Clone is cheap; everything inside
/// is a pool handle or an Arc.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub tokens: Arc<TokenCodec>,
    pub resolver: Arc<dyn PrincipalResolver>,
}

impl AppState {
    pub fn new(pool: PgPool, tokens: TokenCodec, resolver: Arc<dyn PrincipalResolver>) -> Self {
        Self {
            pool,
            tokens: Arc::new(tokens),
            resolver,
        }
    }
}
