//! Authentication middleware for vrq-dr
//!
//! HTTP Basic authentication. Only the password is checked; the user name
//! is ignored. Passwords are compared as SHA-256 digests.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::AppState;

const REALM: &str = "Basic realm=\"vrq-dr\", charset=\"UTF-8\"";

/// SHA-256 digest of a password
pub fn password_digest(password: &str) -> [u8; 32] {
    Sha256::digest(password.as_bytes()).into()
}

/// Password carried by a `Basic` Authorization header
pub fn basic_password(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value
        .strip_prefix("Basic ")
        .or_else(|| value.strip_prefix("basic "))?;
    let decoded = general_purpose::STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (_user, password) = credentials.split_once(':')?;
    Some(password.to_string())
}

/// Authentication middleware
///
/// Applied to protected routes only; `/health` stays public.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let expected = state.password_digest.ok_or(AuthError::NotConfigured)?;

    let password = basic_password(request.headers()).ok_or(AuthError::MissingCredentials)?;

    if password_digest(&password) != expected {
        warn!("Rejected admin login for {}", request.uri().path());
        return Err(AuthError::InvalidCredentials);
    }

    Ok(next.run(request).await)
}

/// Authentication error types for HTTP responses
#[derive(Debug)]
pub enum AuthError {
    /// No admin password configured
    NotConfigured,
    MissingCredentials,
    InvalidCredentials,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::NotConfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Admin view is disabled: no admin password configured",
            ),
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Authentication required")
            }
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid password"),
        };

        let body = Json(json!({
            "error": message,
        }));

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(REALM));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_basic_password_decodes_credentials() {
        let encoded = general_purpose::STANDARD.encode("admin:s3cret:with:colons");
        let headers = headers_with(&format!("Basic {}", encoded));
        assert_eq!(basic_password(&headers).as_deref(), Some("s3cret:with:colons"));
    }

    #[test]
    fn test_basic_password_rejects_malformed_headers() {
        assert_eq!(basic_password(&HeaderMap::new()), None);
        assert_eq!(basic_password(&headers_with("Bearer abc")), None);
        assert_eq!(basic_password(&headers_with("Basic !!!")), None);

        let no_colon = general_purpose::STANDARD.encode("admin");
        assert_eq!(basic_password(&headers_with(&format!("Basic {}", no_colon))), None);
    }

    #[test]
    fn test_password_digest_is_sha256() {
        let hex: String = password_digest("abc")
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        assert_eq!(
            hex,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
