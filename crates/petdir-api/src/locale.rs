//! Response language negotiation.

use std::convert::Infallible;

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use petdir_core::{messages::Locale, store::DirectoryStore};

use crate::AppState;

/// The language user-facing messages are rendered in for this request.
#[derive(Debug, Clone, Copy)]
pub struct RequestLocale(pub Locale);

/// First supported language in `Accept-Language`, else `fallback`.
pub fn negotiate(headers: &HeaderMap, fallback: Locale) -> Locale {
  headers
    .get(header::ACCEPT_LANGUAGE)
    .and_then(|v| v.to_str().ok())
    .and_then(Locale::from_accept_language)
    .unwrap_or(fallback)
}

impl<S> FromRequestParts<AppState<S>> for RequestLocale
where
  S: DirectoryStore + Clone + 'static,
{
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    Ok(RequestLocale(negotiate(&parts.headers, state.default_locale)))
  }
}
