// Authentication core: token codec, credential verifier, principal resolver.
// The per-request filter that ties these together lives in middleware::auth.

pub mod jwt;
pub mod password;
pub mod principal;

pub use jwt::{TokenCodec, TokenError};
pub use principal::{PgPrincipalResolver, Principal, PrincipalResolver, ResolveError};
