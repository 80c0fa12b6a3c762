//! Caller credentials
//!
//! The caller's platform token arrives in the `Authorization` header, either
//! bare or with a `Bearer`/`OAuth` scheme. It is never validated here; it is
//! forwarded to the collaborators, which enforce their own permissions.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use std::convert::Infallible;

/// Per-request context handed to every operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    pub token: Option<String>,
}

impl CallContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(strip_scheme)
            .filter(|token| !token.is_empty())
            .map(str::to_string);
        Self { token }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

fn strip_scheme(value: &str) -> &str {
    let value = value.trim();
    let (scheme, rest) = value.split_once(' ').unwrap_or((value, ""));
    if ["Bearer", "OAuth"]
        .iter()
        .any(|known| known.eq_ignore_ascii_case(scheme))
    {
        rest.trim()
    } else {
        value
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CallContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
