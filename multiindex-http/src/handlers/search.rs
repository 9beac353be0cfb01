use axum::{
    extract::{RawQuery, State},
    http::header,
    response::{IntoResponse, Response},
};
use multiindex::MultiindexError;
use std::sync::Arc;

use super::{run_blocking, AppState, DEFAULT_TENANT};
use crate::render::render_results;

/// `GET /search?q=WORD`: render every page of the default tenant whose body
/// matches `WORD`.
pub async fn search(
    State(state): State<Arc<AppState>>,
    RawQuery(raw_query): RawQuery,
) -> Result<Response, MultiindexError> {
    let word = parse_search_query(raw_query.as_deref())?;
    let registry = Arc::clone(&state.registry);
    let hits = {
        let word = word.clone();
        run_blocking(move || registry.search_word(DEFAULT_TENANT, &word)).await?
    };
    tracing::debug!(query = %word, hits = hits.len(), "search");

    Ok((
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        render_results(&hits),
    )
        .into_response())
}

/// The query string must hold exactly one parameter, `q`, with one value.
pub fn parse_search_query(raw_query: Option<&str>) -> Result<String, MultiindexError> {
    let raw = raw_query.unwrap_or("");
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(raw.as_bytes())
        .into_owned()
        .collect();

    match pairs.as_slice() {
        [(key, value)] if key == "q" => Ok(value.clone()),
        [] => Err(MultiindexError::InvalidQuery(
            "missing q parameter".to_string(),
        )),
        _ => Err(MultiindexError::InvalidQuery(format!(
            "expected exactly one q parameter, got {:?}",
            raw
        ))),
    }
}
