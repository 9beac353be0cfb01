use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use multiindex::MultiindexError;
use std::sync::Arc;

use super::{run_blocking, AppState, DEFAULT_TENANT};
use crate::dto::AvailabilityResponse;

/// `GET /available`: is the storage root initialized?
pub async fn registry_status(State(state): State<Arc<AppState>>) -> Result<Response, MultiindexError> {
    let registry = Arc::clone(&state.registry);
    let ready = run_blocking(move || Ok(registry.available(None))).await?;

    let body = if ready {
        AvailabilityResponse::available("Index storage is available")
    } else {
        AvailabilityResponse::unavailable("Index storage is not initialized")
    };
    Ok(Json(body).into_response())
}

/// `GET /available/index`: does the default tenant's index exist?
pub async fn index_status(State(state): State<Arc<AppState>>) -> Result<Response, MultiindexError> {
    let registry = Arc::clone(&state.registry);
    let count = run_blocking(move || {
        if registry.available(Some(DEFAULT_TENANT)) {
            Ok(registry.doc_count(DEFAULT_TENANT))
        } else {
            Ok(None)
        }
    })
    .await?;

    let body = match count {
        Some(n) => AvailabilityResponse::available(format!(
            "Index '{}' is available with {} pages",
            DEFAULT_TENANT, n
        )),
        None => AvailabilityResponse::unavailable(format!(
            "Index '{}' does not exist",
            DEFAULT_TENANT
        )),
    };
    Ok(Json(body).into_response())
}
