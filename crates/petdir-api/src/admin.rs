//! Handlers for `/admin` endpoints. Every handler requires [`Admin`].
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/admin/claims` | Optional `?status=verified` |
//! | `POST` | `/admin/claims/{id}/approve` | Optional body: `{"notes":"…"}` |
//! | `POST` | `/admin/claims/{id}/reject` | Optional body: `{"notes":"…"}` |
//! | `POST` | `/admin/claims/expire` | Sweep lapsed codes |
//! | `POST` | `/admin/users` | Body: `{"email":"…","displayName":"…"}`; returns a token, 409 if the email is taken |
//! | `POST` | `/admin/listings` | Body: `{"name":"…","website":"…"}` |
//! | `GET`  | `/admin/listings/{id}` | 404 if not found |

use axum::{
  Json,
  extract::{Path, Query, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use petdir_core::{
  claim::{Claim, ClaimStatus},
  directory::{Listing, NewListing, NewUser, User},
  messages::Message,
  store::{ClaimQuery, DirectoryStore},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  auth::{Admin, generate_token, hash_token},
  error::ApiError,
  locale::RequestLocale,
};

// ─── Claims ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status: Option<ClaimStatus>,
}

/// `GET /admin/claims[?status=<status>]`
pub async fn list_claims<S>(
  State(state): State<AppState<S>>,
  _: Admin,
  RequestLocale(locale): RequestLocale,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Claim>>, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  let query = ClaimQuery {
    statuses: params.status.into_iter().collect(),
    ..Default::default()
  };
  let claims = state
    .store
    .list_claims(&query)
    .await
    .map_err(|e| ApiError::internal(e, locale))?;
  Ok(Json(claims))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewBody {
  #[serde(default)]
  pub notes: Option<String>,
}

/// A request without a JSON body carries no notes.
fn review_body(body: Result<Json<ReviewBody>, JsonRejection>) -> Result<ReviewBody, ApiError> {
  match body {
    Ok(Json(body)) => Ok(body),
    Err(JsonRejection::MissingJsonContentType(_)) => Ok(ReviewBody::default()),
    Err(e) => Err(ApiError::bad_request(e.body_text())),
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalResponse {
  pub claim:            Claim,
  pub business_id:      Uuid,
  pub business_created: bool,
}

/// `POST /admin/claims/{id}/approve`
pub async fn approve<S>(
  State(state): State<AppState<S>>,
  _: Admin,
  RequestLocale(locale): RequestLocale,
  Path(claim_id): Path<Uuid>,
  body: Result<Json<ReviewBody>, JsonRejection>,
) -> Result<Json<ApprovalResponse>, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  let body = review_body(body)?;
  let provisioned = state
    .workflow()
    .approve(claim_id, body.notes, Utc::now())
    .await
    .map_err(|e| ApiError::from_claim(e, locale))?;
  Ok(Json(ApprovalResponse {
    claim:            provisioned.claim,
    business_id:      provisioned.business_id,
    business_created: provisioned.business_created,
  }))
}

/// `POST /admin/claims/{id}/reject`
pub async fn reject<S>(
  State(state): State<AppState<S>>,
  _: Admin,
  RequestLocale(locale): RequestLocale,
  Path(claim_id): Path<Uuid>,
  body: Result<Json<ReviewBody>, JsonRejection>,
) -> Result<Json<Claim>, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  let body = review_body(body)?;
  state
    .workflow()
    .reject(claim_id, body.notes, Utc::now())
    .await
    .map(Json)
    .map_err(|e| ApiError::from_claim(e, locale))
}

#[derive(Debug, Serialize)]
pub struct ExpireResponse {
  pub expired: u64,
}

/// `POST /admin/claims/expire`
pub async fn expire<S>(
  State(state): State<AppState<S>>,
  _: Admin,
  RequestLocale(locale): RequestLocale,
) -> Result<Json<ExpireResponse>, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  let expired = state
    .workflow()
    .expire_stale(Utc::now())
    .await
    .map_err(|e| ApiError::from_claim(e, locale))?;
  Ok(Json(ExpireResponse { expired }))
}

// ─── Directory ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CreatedUser {
  pub user:  User,
  /// Shown once; only its digest is stored.
  pub token: String,
}

/// `POST /admin/users`
pub async fn create_user<S>(
  State(state): State<AppState<S>>,
  _: Admin,
  RequestLocale(locale): RequestLocale,
  body: Result<Json<NewUser>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
  let email = body.email.trim();
  if email.is_empty() || !email.contains('@') {
    return Err(ApiError::bad_request(format!("invalid email address: {:?}", body.email)));
  }
  let input = NewUser { email: email.to_owned(), ..body };

  let token = generate_token();
  let user = state
    .store
    .add_user(input, hash_token(&token))
    .await
    .map_err(|e| ApiError::internal(e, locale))?
    .ok_or_else(|| ApiError::Conflict(Message::EmailInUse.render(locale)))?;

  tracing::info!(user_id = %user.user_id, role = %user.role, "user created");
  Ok((StatusCode::CREATED, Json(CreatedUser { user, token })))
}

/// `POST /admin/listings`
pub async fn create_listing<S>(
  State(state): State<AppState<S>>,
  _: Admin,
  RequestLocale(locale): RequestLocale,
  body: Result<Json<NewListing>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
  if body.name.trim().is_empty() {
    return Err(ApiError::bad_request("listing name must not be empty"));
  }
  let listing = state
    .store
    .add_listing(body)
    .await
    .map_err(|e| ApiError::internal(e, locale))?;
  Ok((StatusCode::CREATED, Json(listing)))
}

/// `GET /admin/listings/{id}`
pub async fn get_listing<S>(
  State(state): State<AppState<S>>,
  _: Admin,
  RequestLocale(locale): RequestLocale,
  Path(id): Path<Uuid>,
) -> Result<Json<Listing>, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  state
    .store
    .get_listing(id)
    .await
    .map_err(|e| ApiError::internal(e, locale))?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(Message::ListingNotFound.render(locale)))
}
