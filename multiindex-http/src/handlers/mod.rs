use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use multiindex::{IndexRegistry, MultiindexError};
use std::sync::Arc;

pub mod available;
pub mod documents;
pub mod indices;
pub mod search;

/// Tenant served by the HTTP surface.
pub const DEFAULT_TENANT: &str = "pages";

pub struct AppState {
    pub registry: Arc<IndexRegistry>,
}

impl AppState {
    pub fn new(registry: Arc<IndexRegistry>) -> Self {
        AppState { registry }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Available,
    AvailableIndex,
    Search,
    Favicon,
    Store,
    NewIndex,
    Preflight,
}

/// Map method and path onto exactly one route. One leading and one trailing
/// `/` are ignored, so `/search` and `/search/` are the same route.
pub fn resolve_route(method: &Method, path: &str) -> Result<Route, MultiindexError> {
    if *method == Method::OPTIONS {
        return Ok(Route::Preflight);
    }

    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    let parts: Vec<&str> = trimmed.split('/').collect();

    match *method {
        Method::GET => match parts.as_slice() {
            ["available"] => Ok(Route::Available),
            ["available", "index"] => Ok(Route::AvailableIndex),
            ["available", ..] => Err(MultiindexError::InvalidPath(path.to_string())),
            ["search"] => Ok(Route::Search),
            ["search", ..] => Err(MultiindexError::InvalidPath(path.to_string())),
            ["favicon.ico"] => Ok(Route::Favicon),
            _ => Err(MultiindexError::Forbidden(path.to_string())),
        },
        Method::POST => match parts.as_slice() {
            ["store"] => Ok(Route::Store),
            ["newindex"] => Ok(Route::NewIndex),
            _ => Err(MultiindexError::Forbidden(path.to_string())),
        },
        _ => Err(MultiindexError::MethodNotAllowed(method.to_string())),
    }
}

/// `application/json`, parameters such as `charset` allowed.
pub(crate) fn require_json(headers: &HeaderMap) -> Result<(), MultiindexError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let essence = content_type.split(';').next().unwrap_or("").trim();
    if essence.eq_ignore_ascii_case("application/json") {
        Ok(())
    } else {
        Err(MultiindexError::UnsupportedContentType(
            content_type.to_string(),
        ))
    }
}

/// Fallback for every authenticated request the route table does not match,
/// including known paths reached with another method.
pub async fn dispatch(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, MultiindexError> {
    if method == Method::POST {
        require_json(&headers)?;
    }

    match resolve_route(&method, uri.path())? {
        Route::Available => available::registry_status(State(state)).await,
        Route::AvailableIndex => available::index_status(State(state)).await,
        Route::Search => {
            let raw_query = RawQuery(uri.query().map(str::to_string));
            search::search(State(state), raw_query).await
        }
        Route::Favicon => Ok(favicon().await.into_response()),
        Route::Store => documents::store(State(state), headers, body).await,
        Route::NewIndex => indices::new_index(State(state), headers).await,
        Route::Preflight => Ok(preflight()),
    }
}

/// `GET /favicon.ico`: empty 200.
pub async fn favicon() -> StatusCode {
    StatusCode::OK
}

pub fn preflight() -> Response {
    let mut resp = StatusCode::OK.into_response();
    let headers = resp.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type"),
    );
    resp
}

/// Run registry work on the blocking pool.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, MultiindexError>
where
    F: FnOnce() -> Result<T, MultiindexError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| MultiindexError::Internal(format!("spawn_blocking join error: {}", e)))?
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use axum::{body::Body, http::Request};
    use tempfile::TempDir;

    // ── resolve_route ──

    #[test]
    fn get_routes() {
        let get = Method::GET;
        assert_eq!(resolve_route(&get, "/available").unwrap(), Route::Available);
        assert_eq!(resolve_route(&get, "/available/").unwrap(), Route::Available);
        assert_eq!(
            resolve_route(&get, "/available/index").unwrap(),
            Route::AvailableIndex
        );
        assert_eq!(resolve_route(&get, "/search").unwrap(), Route::Search);
        assert_eq!(resolve_route(&get, "/search/").unwrap(), Route::Search);
        assert_eq!(resolve_route(&get, "/favicon.ico").unwrap(), Route::Favicon);
    }

    #[test]
    fn malformed_known_paths_are_400() {
        for path in ["/available/foo/bar", "/available/other", "/search/deeper", "/available//"] {
            let err = resolve_route(&Method::GET, path).unwrap_err();
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST, "{path}");
        }
    }

    #[test]
    fn unknown_paths_are_403() {
        for path in ["/", "/secret", "/availability", "/searching"] {
            let err = resolve_route(&Method::GET, path).unwrap_err();
            assert_eq!(err.status_code(), StatusCode::FORBIDDEN, "{path}");
        }
        let err = resolve_route(&Method::POST, "/search").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn post_routes() {
        assert_eq!(resolve_route(&Method::POST, "/store").unwrap(), Route::Store);
        assert_eq!(
            resolve_route(&Method::POST, "/newindex/").unwrap(),
            Route::NewIndex
        );
    }

    #[test]
    fn options_always_preflight_and_other_methods_405() {
        assert_eq!(
            resolve_route(&Method::OPTIONS, "/anything/at/all").unwrap(),
            Route::Preflight
        );
        for method in [Method::PUT, Method::DELETE, Method::PATCH] {
            let err = resolve_route(&method, "/store").unwrap_err();
            assert_eq!(err.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        }
    }

    // ── require_json ──

    #[test]
    fn json_content_type_with_params_is_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        assert!(require_json(&headers).is_ok());
    }

    #[test]
    fn other_content_types_are_rejected() {
        let mut headers = HeaderMap::new();
        assert!(require_json(&headers).is_err());
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let err = require_json(&headers).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_ACCEPTABLE);
    }

    // ── dispatch through the router ──

    #[tokio::test]
    async fn favicon_is_empty_200() {
        let tmp = TempDir::new().unwrap();
        let app = make_app(make_state(&tmp));
        let (status, _, body) = call(&app, get("/favicon.ico")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn preflight_without_credentials() {
        let tmp = TempDir::new().unwrap();
        let app = make_app(make_state(&tmp));
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/store")
            .body(Body::empty())
            .unwrap();
        let (status, headers, body) = call(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_METHODS],
            "GET, POST, OPTIONS"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "content-type");
    }

    #[tokio::test]
    async fn unknown_get_is_403() {
        let tmp = TempDir::new().unwrap();
        let app = make_app(make_state(&tmp));
        let (status, _, _) = call(&app, get("/admin")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn head_is_answered_like_get_on_get_routes() {
        let tmp = TempDir::new().unwrap();
        let app = make_app(make_state(&tmp));
        let mut req = get("/available");
        *req.method_mut() = Method::HEAD;
        let (status, _, body) = call(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());

        let mut req = get("/store");
        *req.method_mut() = Method::HEAD;
        let (status, _, _) = call(&app, req).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn put_is_405() {
        let tmp = TempDir::new().unwrap();
        let app = make_app(make_state(&tmp));
        let mut req = post_json("/store", "{}");
        *req.method_mut() = Method::PUT;
        let (status, _, _) = call(&app, req).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn wrong_content_type_beats_unknown_post_path() {
        let tmp = TempDir::new().unwrap();
        let app = make_app(make_state(&tmp));
        let mut req = post_json("/elsewhere", "{}");
        req.headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let (status, _, _) = call(&app, req).await;
        assert_eq!(status, StatusCode::NOT_ACCEPTABLE);

        let (status, _, _) = call(&app, post_json("/elsewhere", "{}")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn known_path_with_other_method_falls_through() {
        let tmp = TempDir::new().unwrap();
        let app = make_app(make_state(&tmp));

        let (status, _, _) = call(&app, get("/store")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _, _) = call(&app, post_json("/available", "{}")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let mut req = get("/search?q=x");
        *req.method_mut() = Method::DELETE;
        let (status, _, _) = call(&app, req).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let mut req = post_json("/available", "{}");
        req.headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let (status, _, _) = call(&app, req).await;
        assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    }

    #[tokio::test]
    async fn wrong_content_type_on_store_is_406() {
        let tmp = TempDir::new().unwrap();
        let state = make_state(&tmp);
        let app = make_app(state.clone());
        let mut req = post_json("/store/", r#"{"url":"http://x","title":"X","text":"t"}"#);
        req.headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let (status, _, _) = call(&app, req).await;
        assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
        assert!(!state.registry.available(Some(DEFAULT_TENANT)));
    }

    #[tokio::test]
    async fn unauthenticated_request_is_401() {
        let tmp = TempDir::new().unwrap();
        let app = make_app(make_state(&tmp));
        let req = Request::builder()
            .uri("/available")
            .body(Body::empty())
            .unwrap();
        let (status, headers, _) = call(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(headers.contains_key(header::WWW_AUTHENTICATE));
    }
}
