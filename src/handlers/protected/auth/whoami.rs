use serde::Serialize;
use uuid::Uuid;

use crate::auth::Principal;
use crate::middleware::response::ApiResponse;

#[derive(Debug, Serialize)]
pub struct WhoamiResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub admin: bool,
}

/// GET /api/auth/whoami - The authenticated identity for this request,
/// exactly as the gate resolved it
pub async fn whoami(principal: Principal) -> ApiResponse<WhoamiResponse> {
    ApiResponse::success(WhoamiResponse {
        id: principal.id,
        email: principal.email,
        first_name: principal.first_name,
        last_name: principal.last_name,
        admin: principal.admin,
    })
}
