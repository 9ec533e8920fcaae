//! Request authentication.
//!
//! Admin routes use HTTP Basic checked against an argon2 PHC string. User
//! routes carry an opaque bearer token; only its SHA-256 digest is stored.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use petdir_core::{directory::User, messages::Message, store::DirectoryStore};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::{AppState, error::ApiError, locale::negotiate};

/// Admin credentials accepted by this server instance.
#[derive(Clone)]
pub struct AdminAuth {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Zero-size marker: present in the handler means an admin authenticated.
pub struct Admin;

/// The user a bearer token belongs to.
pub struct CurrentUser(pub User);

/// A fresh API token: 32 random bytes, hex encoded.
pub fn generate_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

/// The digest stored for, and looked up from, a bearer token.
pub fn hash_token(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}

/// Check HTTP Basic credentials against `auth`.
pub fn verify_admin(headers: &HeaderMap, auth: &AdminAuth) -> Result<(), ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::AdminUnauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::AdminUnauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::AdminUnauthorized)?;
  let creds = std::str::from_utf8(&decoded).map_err(|_| ApiError::AdminUnauthorized)?;

  let (username, password) =
    creds.split_once(':').ok_or(ApiError::AdminUnauthorized)?;

  if username != auth.username {
    return Err(ApiError::AdminUnauthorized);
  }

  let parsed_hash =
    PasswordHash::new(&auth.password_hash).map_err(|_| ApiError::AdminUnauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::AdminUnauthorized)?;

  Ok(())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let token = value.strip_prefix("Bearer ")?.trim();
  (!token.is_empty()).then_some(token)
}

impl<S> FromRequestParts<AppState<S>> for Admin
where
  S: DirectoryStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    verify_admin(&parts.headers, &state.admin)?;
    Ok(Admin)
  }
}

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: DirectoryStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let locale = negotiate(&parts.headers, state.default_locale);
    let unauthenticated = || ApiError::Unauthenticated(Message::Unauthenticated.render(locale));

    let token = bearer_token(&parts.headers).ok_or_else(unauthenticated)?;
    let user = state
      .store
      .find_user_by_token(&hash_token(token))
      .await
      .map_err(|e| ApiError::internal(e, locale))?
      .ok_or_else(unauthenticated)?;

    Ok(CurrentUser(user))
  }
}
