use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use multiindex::MultiindexError;
use std::sync::Arc;

use super::{require_json, run_blocking, AppState, DEFAULT_TENANT};
use crate::dto::{SavedResponse, StoreRequest};

/// `POST /store`: validate the payload, then index it under the default tenant.
pub async fn store(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, MultiindexError> {
    require_json(&headers)?;
    let page = StoreRequest::from_json(&body)?.into_page();
    let registry = Arc::clone(&state.registry);
    let outcome = run_blocking(move || registry.store_document(DEFAULT_TENANT, &page)).await?;
    tracing::debug!(?outcome, "store");
    Ok(Json(SavedResponse::saved()).into_response())
}
