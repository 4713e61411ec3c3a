//! Record API endpoints.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    Extension, Json,
};
use serde_json::value::RawValue;

use super::ApiResult;
use crate::errors::AppError;
use crate::models::{Caller, Record, WriteAck};
use crate::store::Precondition;
use crate::AppState;

/// GET /api/data - The stored record, verbatim.
pub async fn get_data(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let (record, revision) = state.records.read().await?;

    match Record::summarize(record.get()) {
        Some(summary) => tracing::info!(
            posts = summary.posts,
            comments = summary.comments,
            reviews = summary.reviews,
            "Record loaded"
        ),
        None => tracing::warn!("Record loaded but it does not look like a feed document"),
    }

    Ok((
        [(header::ETAG, revision.to_etag())],
        [(header::CONTENT_TYPE, "application/json")],
        record.get().to_owned(),
    ))
}

/// POST /api/data - Replace the stored record.
pub async fn save_data(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    if state.config.require_admin_for_write && !caller.is_admin {
        tracing::warn!(
            "Write refused for {}",
            caller
                .user_id()
                .map_or_else(|| "anonymous caller".to_string(), |id| format!("user {id}"))
        );
        return Err(AppError::Forbidden("Admin only".to_string()));
    }

    let precondition = match headers.get(header::IF_MATCH) {
        Some(value) => Some(
            value
                .to_str()
                .ok()
                .and_then(Precondition::parse)
                .ok_or_else(|| AppError::BadRequest("Malformed If-Match header".to_string()))?,
        ),
        None if state.config.require_revision => {
            return Err(AppError::PreconditionRequired(
                "Writes must name the revision they are based on (If-Match)".to_string(),
            ));
        }
        None => None,
    };

    let record: &RawValue = serde_json::from_slice(&body)?;
    let revision = state.records.write(record, precondition.as_ref()).await?;

    tracing::info!(
        user = caller.user_id(),
        revision = revision.as_str(),
        conditional = precondition.is_some(),
        "Record saved"
    );

    Ok((
        [(header::ETAG, revision.to_etag())],
        Json(WriteAck {
            success: true,
            revision: revision.as_str().to_string(),
        }),
    ))
}
