//! Caller authentication extractor

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::CallerIdentity;

/// Extractor that requires a valid bearer token.
///
/// Handlers taking this argument never run for anonymous requests: the
/// rejection is produced before any store is consulted.
#[derive(Debug, Clone)]
pub struct RequireCaller(pub CallerIdentity);

impl FromRequestParts<AppState> for RequireCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;

        let caller = state.authenticator.verify(&token).await.map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            ApiError::from(e)
        })?;

        Ok(RequireCaller(caller))
    }
}

/// Pull the token out of `Authorization: Bearer <token>`
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    token.map(str::to_string).ok_or_else(|| {
        ApiError::unauthorized(
            "Authentication required. Provide a token via 'Authorization: Bearer <token>'",
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer_token() {
        let token = extract_bearer_token(&headers("Bearer eyJhbGciOiJIUzI1NiJ9.test")).unwrap();
        assert_eq!(token, "eyJhbGciOiJIUzI1NiJ9.test");

        let trimmed = extract_bearer_token(&headers("Bearer   abc   ")).unwrap();
        assert_eq!(trimmed, "abc");
    }

    #[test]
    fn test_missing_or_foreign_scheme() {
        let err = extract_bearer_token(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);

        assert!(extract_bearer_token(&headers("Basic dXNlcjpwYXNz")).is_err());
        assert!(extract_bearer_token(&headers("Bearer    ")).is_err());
    }
}
