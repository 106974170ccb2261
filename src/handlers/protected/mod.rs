// Endpoints behind the authorization gate: every handler here takes a
// `Principal` extractor, which answers 401 for anonymous requests.

pub mod auth;
pub mod session;
pub mod teacher;
pub mod user;
