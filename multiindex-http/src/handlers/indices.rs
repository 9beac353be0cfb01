use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use multiindex::{CreateOutcome, MultiindexError};
use std::sync::Arc;

use super::{require_json, run_blocking, AppState, DEFAULT_TENANT};

/// `POST /newindex`: 201 when the default tenant's index was created now,
/// 200 when it already existed.
pub async fn new_index(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, MultiindexError> {
    require_json(&headers)?;
    let registry = Arc::clone(&state.registry);
    let outcome = run_blocking(move || registry.create_index(DEFAULT_TENANT, false)).await?;
    let status = match outcome {
        CreateOutcome::Created => StatusCode::CREATED,
        CreateOutcome::AlreadyExists => StatusCode::OK,
    };
    Ok(status.into_response())
}
