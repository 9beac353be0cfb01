use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use multiindex::MultiindexError;
use std::sync::Arc;

/// Decides whether an `Authorization` header value grants access.
pub trait Authenticator: Send + Sync + 'static {
    fn authenticate(&self, header: &str) -> bool;
}

/// One shared `user:password` pair checked as HTTP Basic credentials.
///
/// Only a SHA-256 hash of the expected header value is kept in memory.
pub struct StaticCredential {
    expected_hash: String,
}

impl StaticCredential {
    pub fn new(user: &str, password: &str) -> Self {
        let header = basic_header(user, password);
        StaticCredential {
            expected_hash: hash_header(&header),
        }
    }

    /// Parse `user:password`. The user must be non-empty; the password may
    /// contain further colons.
    pub fn from_pair(pair: &str) -> Option<Self> {
        let (user, password) = pair.split_once(':')?;
        if user.is_empty() {
            return None;
        }
        Some(Self::new(user, password))
    }
}

impl Authenticator for StaticCredential {
    fn authenticate(&self, header: &str) -> bool {
        verify_header(header, &self.expected_hash)
    }
}

pub fn basic_header(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", user, password)))
}

fn hash_header(value: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

fn verify_header(value: &str, expected_hash: &str) -> bool {
    let computed_hash = hash_header(value);
    if computed_hash.len() != expected_hash.len() {
        return false;
    }
    let mut result = 0u8;
    for (a, b) in computed_hash.bytes().zip(expected_hash.bytes()) {
        result |= a ^ b;
    }
    result == 0
}

/// Rejects every non-`OPTIONS` request whose credentials do not check out.
pub async fn require_basic_auth(
    State(authenticator): State<Arc<dyn Authenticator>>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|header| authenticator.authenticate(header));

    if !authorized {
        tracing::debug!(
            method = %request.method(),
            path = %request.uri().path(),
            "rejected unauthenticated request"
        );
        return MultiindexError::Unauthorized.into_response();
    }

    next.run(request).await
}
