//! Privilege endpoint.

use axum::{Extension, Json};

use crate::models::{AdminStatus, Caller};

/// GET /api/check-admin - Whether the caller is the administrator.
pub async fn check_admin(Extension(caller): Extension<Caller>) -> Json<AdminStatus> {
    Json(AdminStatus {
        is_admin: caller.is_admin,
    })
}
