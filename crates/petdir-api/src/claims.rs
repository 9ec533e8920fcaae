//! Handlers for the claimant's own endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/claims` | Body: `{"listingId":"…","method":"email_domain","email":"…"}` |
//! | `GET`  | `/claims` | The caller's claims |
//! | `GET`  | `/claims/{id}` | 404 if missing or not the caller's |
//! | `POST` | `/claims/{id}/resend` | Issue a fresh code |
//! | `POST` | `/claims/{id}/verify` | Body: `{"code":"123456"}` |
//! | `GET`  | `/me` | The authenticated user |

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use petdir_core::{
  claim::{Claim, ClaimStatus, VerificationMethod},
  directory::User,
  messages::Message,
  store::{ClaimQuery, DirectoryStore},
  workflow::{ClaimRequest, VerifyOutcome},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  auth::CurrentUser,
  error::ApiError,
  locale::RequestLocale,
};

/// A claim plus a human-readable status line.
#[derive(Debug, Serialize)]
pub struct ClaimEnvelope {
  pub claim:   Claim,
  pub message: String,
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub listing_id: Uuid,
  pub method:     VerificationMethod,
  pub email:      Option<String>,
  pub phone:      Option<String>,
}

/// `POST /claims`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  RequestLocale(locale): RequestLocale,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
  let request = ClaimRequest {
    listing_id: body.listing_id,
    method:     body.method,
    email:      body.email,
    phone:      body.phone,
  };

  let claim = state
    .workflow()
    .initiate(&user, request, Utc::now())
    .await
    .map_err(|e| ApiError::from_claim(e, locale))?;

  Ok((
    StatusCode::CREATED,
    Json(ClaimEnvelope { claim, message: Message::CodeSent.render(locale) }),
  ))
}

// ─── Read ─────────────────────────────────────────────────────────────────────

/// `GET /claims`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  RequestLocale(locale): RequestLocale,
) -> Result<Json<Vec<Claim>>, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  let query = ClaimQuery { user_id: Some(user.user_id), ..Default::default() };
  let claims = state
    .store
    .list_claims(&query)
    .await
    .map_err(|e| ApiError::internal(e, locale))?;
  Ok(Json(claims))
}

/// `GET /claims/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  RequestLocale(locale): RequestLocale,
  Path(claim_id): Path<Uuid>,
) -> Result<Json<Claim>, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  state
    .workflow()
    .owned_claim(user.user_id, claim_id)
    .await
    .map(Json)
    .map_err(|e| ApiError::from_claim(e, locale))
}

/// `GET /me`
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> { Json(user) }

// ─── Resend ───────────────────────────────────────────────────────────────────

/// `POST /claims/{id}/resend`
pub async fn resend<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  RequestLocale(locale): RequestLocale,
  Path(claim_id): Path<Uuid>,
) -> Result<Json<ClaimEnvelope>, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  let claim = state
    .workflow()
    .resend(&user, claim_id, Utc::now())
    .await
    .map_err(|e| ApiError::from_claim(e, locale))?;
  Ok(Json(ClaimEnvelope { claim, message: Message::CodeSent.render(locale) }))
}

// ─── Verify ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
  pub code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
  pub success:      bool,
  pub message:      String,
  pub status:       ClaimStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub business_id:  Option<Uuid>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub redirect_url: Option<String>,
}

/// `POST /claims/{id}/verify`, body: `{"code":"123456"}`
pub async fn verify<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  RequestLocale(locale): RequestLocale,
  Path(claim_id): Path<Uuid>,
  body: Result<Json<VerifyBody>, JsonRejection>,
) -> Result<Json<VerifyResponse>, ApiError>
where
  S: DirectoryStore + Clone + 'static,
{
  let missing = || ApiError::bad_request(Message::MissingCode.render(locale));
  let Json(body) = body.map_err(|_| missing())?;
  let code = body
    .code
    .filter(|c| !c.trim().is_empty())
    .ok_or_else(missing)?;

  let outcome = state
    .workflow()
    .verify(user.user_id, claim_id, &code, Utc::now())
    .await
    .map_err(|e| ApiError::from_claim(e, locale))?;

  let status = outcome.status();
  let response = match outcome {
    VerifyOutcome::AlreadyVerified { .. } => VerifyResponse {
      success: true,
      message: Message::AlreadyVerified.render(locale),
      status,
      business_id: None,
      redirect_url: None,
    },
    VerifyOutcome::Approved { business_id, redirect_url, .. } => VerifyResponse {
      success: true,
      message: Message::ClaimApproved.render(locale),
      status,
      business_id: Some(business_id),
      redirect_url: Some(redirect_url),
    },
    VerifyOutcome::AwaitingReview { .. } => VerifyResponse {
      success: true,
      message: Message::AwaitingReview.render(locale),
      status,
      business_id: None,
      redirect_url: None,
    },
  };
  Ok(Json(response))
}
