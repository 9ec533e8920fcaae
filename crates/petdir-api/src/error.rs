//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use petdir_core::{
  messages::{Locale, Message},
  workflow::ClaimError,
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler. Every variant renders as a JSON body
/// of the form `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Missing or unknown bearer token.
  #[error("unauthenticated: {0}")]
  Unauthenticated(String),

  /// Admin credentials missing or wrong.
  #[error("admin credentials required")]
  AdminUnauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {message}")]
  BadRequest {
    message:            String,
    remaining_attempts: Option<u32>,
  },

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("internal error: {source}")]
  Internal {
    message: String,
    #[source]
    source:  Box<dyn std::error::Error + Send + Sync>,
  },
}

impl ApiError {
  pub fn bad_request(message: impl Into<String>) -> Self {
    Self::BadRequest { message: message.into(), remaining_attempts: None }
  }

  /// A storage failure; `locale` picks the text shown to the client.
  pub fn internal(e: impl std::error::Error + Send + Sync + 'static, locale: Locale) -> Self {
    Self::Internal { message: Message::Internal.render(locale), source: Box::new(e) }
  }

  /// Translate a workflow error, rendering user-facing text in `locale`.
  pub fn from_claim(error: ClaimError, locale: Locale) -> Self {
    let bad = |m: Message| Self::bad_request(m.render(locale));
    match error {
      ClaimError::NotFound => Self::NotFound(Message::ClaimNotFound.render(locale)),
      ClaimError::ListingNotFound => {
        Self::NotFound(Message::ListingNotFound.render(locale))
      }
      ClaimError::UserNotFound => Self::NotFound(Message::UserNotFound.render(locale)),
      ClaimError::InvalidState(_) => bad(Message::InvalidState),
      ClaimError::Expired => bad(Message::CodeExpired),
      ClaimError::AttemptsExhausted => bad(Message::AttemptsExhausted),
      ClaimError::InvalidCode { remaining } => Self::BadRequest {
        message:            Message::InvalidCode { remaining }.render(locale),
        remaining_attempts: Some(remaining),
      },
      ClaimError::Conflict(m) => Self::Conflict(m),
      ClaimError::BadInput(m) => Self::bad_request(m),
      ClaimError::Store(source) => Self::Internal {
        message: Message::Internal.render(locale),
        source,
      },
      e @ ClaimError::ExpiryOutOfRange { .. } => Self::internal(e, locale),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::Unauthenticated(m) => {
        let mut res =
          (StatusCode::UNAUTHORIZED, Json(json!({ "error": m }))).into_response();
        res
          .headers_mut()
          .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        res
      }
      ApiError::AdminUnauthorized => {
        let mut res = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "error": "Unauthorized" })),
        )
          .into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"petdir-admin\""),
        );
        res
      }
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response()
      }
      ApiError::BadRequest { message, remaining_attempts: Some(remaining) } => (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message, "remainingAttempts": remaining })),
      )
        .into_response(),
      ApiError::BadRequest { message, remaining_attempts: None } => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
      }
      ApiError::Conflict(m) => {
        (StatusCode::CONFLICT, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Internal { message, source } => {
        tracing::error!(error = %source, "request failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "error": message })),
        )
          .into_response()
      }
    }
  }
}
