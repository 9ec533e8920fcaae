//! JSON REST API for petdir listing claims.
//!
//! Exposes an axum [`Router`] backed by any [`DirectoryStore`]. Claimants
//! authenticate with a bearer token; admin routes use HTTP Basic. TLS and
//! request tracing are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", petdir_api::api_router(state))
//! ```

pub mod admin;
pub mod auth;
pub mod claims;
pub mod error;
pub mod locale;
pub mod notify;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use petdir_core::{
  messages::Locale,
  store::DirectoryStore,
  workflow::{ClaimSettings, ClaimWorkflow, CodeNotifier},
};

pub use error::ApiError;

use auth::AdminAuth;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: DirectoryStore> {
  pub store:          Arc<S>,
  pub notifier:       Arc<dyn CodeNotifier>,
  pub settings:       Arc<ClaimSettings>,
  pub admin:          Arc<AdminAuth>,
  /// Used when `Accept-Language` names nothing we speak.
  pub default_locale: Locale,
}

impl<S: DirectoryStore> AppState<S> {
  pub fn workflow(&self) -> ClaimWorkflow<'_, S> {
    ClaimWorkflow::new(self.store.as_ref(), self.notifier.as_ref(), &self.settings)
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: DirectoryStore + Clone + 'static,
{
  Router::new()
    // Claimant
    .route("/claims", get(claims::list::<S>).post(claims::create::<S>))
    .route("/claims/{id}", get(claims::get_one::<S>))
    .route("/claims/{id}/resend", post(claims::resend::<S>))
    .route("/claims/{id}/verify", post(claims::verify::<S>))
    .route("/me", get(claims::me))
    // Admin review
    .route("/admin/claims", get(admin::list_claims::<S>))
    .route("/admin/claims/expire", post(admin::expire::<S>))
    .route("/admin/claims/{id}/approve", post(admin::approve::<S>))
    .route("/admin/claims/{id}/reject", post(admin::reject::<S>))
    // Directory
    .route("/admin/users", post(admin::create_user::<S>))
    .route("/admin/listings", post(admin::create_listing::<S>))
    .route("/admin/listings/{id}", get(admin::get_listing::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
  use petdir_core::workflow::CodeDelivery;
  use petdir_store_sqlite::SqliteStore;
  use rand_core::OsRng;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use super::*;

  /// Remembers the last code sent for each claim.
  #[derive(Default)]
  struct Outbox {
    sent: Mutex<Vec<(Uuid, String)>>,
  }

  impl CodeNotifier for Outbox {
    fn deliver(&self, delivery: &CodeDelivery<'_>) {
      self
        .sent
        .lock()
        .unwrap()
        .push((delivery.claim.claim_id, delivery.code.to_owned()));
    }
  }

  impl Outbox {
    fn code_for(&self, claim_id: &str) -> String {
      let id: Uuid = claim_id.parse().unwrap();
      self
        .sent
        .lock()
        .unwrap()
        .iter()
        .rev()
        .find(|(c, _)| *c == id)
        .map(|(_, code)| code.clone())
        .unwrap()
    }
  }

  fn wrong_code(code: &str) -> &'static str {
    if code == "000000" { "111111" } else { "000000" }
  }

  struct Harness {
    state:  AppState<SqliteStore>,
    outbox: Arc<Outbox>,
  }

  async fn harness() -> Harness {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(b"secret", &salt)
      .unwrap()
      .to_string();
    let outbox = Arc::new(Outbox::default());

    let state = AppState {
      store:          Arc::new(store),
      notifier:       outbox.clone(),
      settings:       Arc::new(ClaimSettings::default()),
      admin:          Arc::new(AdminAuth {
        username:      "admin".to_string(),
        password_hash: hash,
      }),
      default_locale: Locale::Nl,
    };
    Harness { state, outbox }
  }

  fn admin_auth() -> String {
    format!("Basic {}", B64.encode("admin:secret"))
  }

  fn bearer(token: &str) -> String { format!("Bearer {token}") }

  async fn send(
    state: &AppState<SqliteStore>,
    method: &str,
    uri: &str,
    headers: Vec<(header::HeaderName, String)>,
    body: Option<Value>,
  ) -> (StatusCode, Value, axum::http::HeaderMap) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    let req = match body {
      Some(json) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };

    let resp = api_router(state.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value, headers)
  }

  /// Creates a user through the admin API and returns `(user_id, token)`.
  async fn create_user(state: &AppState<SqliteStore>, email: &str) -> (String, String) {
    let (status, body, _) = send(
      state,
      "POST",
      "/admin/users",
      vec![(header::AUTHORIZATION, admin_auth())],
      Some(json!({ "email": email, "displayName": "Test" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (
      body["user"]["userId"].as_str().unwrap().to_owned(),
      body["token"].as_str().unwrap().to_owned(),
    )
  }

  async fn create_listing(state: &AppState<SqliteStore>, website: &str) -> String {
    let (status, body, _) = send(
      state,
      "POST",
      "/admin/listings",
      vec![(header::AUTHORIZATION, admin_auth())],
      Some(json!({ "name": "Dierenkliniek De Hoef", "website": website })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["listingId"].as_str().unwrap().to_owned()
  }

  async fn open_claim(
    state: &AppState<SqliteStore>,
    token: &str,
    body: Value,
  ) -> (StatusCode, Value) {
    let (status, body, _) = send(
      state,
      "POST",
      "/claims",
      vec![(header::AUTHORIZATION, bearer(token))],
      Some(body),
    )
    .await;
    (status, body)
  }

  async fn submit(
    state: &AppState<SqliteStore>,
    token: &str,
    claim_id: &str,
    code: &str,
    language: Option<&str>,
  ) -> (StatusCode, Value) {
    let mut headers = vec![(header::AUTHORIZATION, bearer(token))];
    if let Some(lang) = language {
      headers.push((header::ACCEPT_LANGUAGE, lang.to_owned()));
    }
    let (status, body, _) = send(
      state,
      "POST",
      &format!("/claims/{claim_id}/verify"),
      headers,
      Some(json!({ "code": code })),
    )
    .await;
    (status, body)
  }

  // ── Authentication ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn user_routes_require_bearer_token() {
    let h = harness().await;
    let (status, body, headers) = send(&h.state, "GET", "/me", vec![], None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(headers.get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
    assert_eq!(body["error"], "Je moet ingelogd zijn.");

    let (status, ..) = send(
      &h.state,
      "GET",
      "/me",
      vec![(header::AUTHORIZATION, bearer("not-a-real-token"))],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn unauthenticated_verify_is_rejected_before_anything_else() {
    let h = harness().await;
    let (status, body, _) = send(
      &h.state,
      "POST",
      &format!("/claims/{}/verify", Uuid::new_v4()),
      vec![(header::ACCEPT_LANGUAGE, "en".to_owned())],
      Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "You must be signed in.");
  }

  #[tokio::test]
  async fn admin_routes_require_basic_auth() {
    let h = harness().await;
    let (status, _, headers) = send(&h.state, "GET", "/admin/claims", vec![], None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(
      headers
        .get(header::WWW_AUTHENTICATE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("Basic")
    );

    let wrong = format!("Basic {}", B64.encode("admin:nope"));
    let (status, ..) = send(
      &h.state,
      "GET",
      "/admin/claims",
      vec![(header::AUTHORIZATION, wrong)],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, token) = create_user(&h.state, "someone@example.nl").await;
    let (status, ..) = send(
      &h.state,
      "GET",
      "/admin/claims",
      vec![(header::AUTHORIZATION, bearer(&token))],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn me_returns_the_token_owner() {
    let h = harness().await;
    let (user_id, token) = create_user(&h.state, "eva@example.nl").await;
    let (status, body, _) = send(
      &h.state,
      "GET",
      "/me",
      vec![(header::AUTHORIZATION, bearer(&token))],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], user_id.as_str());
    assert_eq!(body["role"], "user");
  }

  // ── Claim flow ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn email_domain_claim_is_auto_approved() {
    let h = harness().await;
    let (user_id, token) = create_user(&h.state, "eva@example.nl").await;
    let listing_id = create_listing(&h.state, "https://www.dekliniek.nl/contact").await;

    let (status, body) = open_claim(
      &h.state,
      &token,
      json!({ "listingId": listing_id, "method": "email_domain", "email": "info@dekliniek.nl" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["claim"]["status"], "verification_sent");
    assert!(body["claim"].get("verificationCode").is_none());
    let claim_id = body["claim"]["claimId"].as_str().unwrap().to_owned();
    let code = h.outbox.code_for(&claim_id);

    let (status, body) =
      submit(&h.state, &token, &claim_id, wrong_code(&code), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["remainingAttempts"], 4);
    assert_eq!(body["error"], "Ongeldige code. Je hebt nog 4 pogingen over.");

    let (status, body) = submit(&h.state, &token, &claim_id, &code, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "approved");
    assert_eq!(body["redirectUrl"], "/dashboard");
    let business_id = body["businessId"].as_str().unwrap().to_owned();

    let (status, listing, _) = send(
      &h.state,
      "GET",
      &format!("/admin/listings/{listing_id}"),
      vec![(header::AUTHORIZATION, admin_auth())],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["ownerId"], user_id.as_str());
    assert_eq!(listing["businessId"], business_id.as_str());

    let (_, me, _) = send(
      &h.state,
      "GET",
      "/me",
      vec![(header::AUTHORIZATION, bearer(&token))],
      None,
    )
    .await;
    assert_eq!(me["role"], "business");

    // Submitting again is a no-op success.
    let (status, body) = submit(&h.state, &token, &claim_id, &code, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");
    assert!(body.get("businessId").is_none());
  }

  #[tokio::test]
  async fn messages_follow_accept_language() {
    let h = harness().await;
    let (_, token) = create_user(&h.state, "eva@example.nl").await;
    let listing_id = create_listing(&h.state, "https://dekliniek.nl").await;
    let (_, body) = open_claim(
      &h.state,
      &token,
      json!({ "listingId": listing_id, "method": "email_domain", "email": "info@dekliniek.nl" }),
    )
    .await;
    let claim_id = body["claim"]["claimId"].as_str().unwrap().to_owned();
    let code = h.outbox.code_for(&claim_id);

    let (status, body) =
      submit(&h.state, &token, &claim_id, wrong_code(&code), Some("en-GB,en;q=0.8"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid code. You have 4 attempts remaining.");
  }

  #[tokio::test]
  async fn verify_without_code_is_bad_request() {
    let h = harness().await;
    let (_, token) = create_user(&h.state, "eva@example.nl").await;
    let listing_id = create_listing(&h.state, "https://dekliniek.nl").await;
    let (_, body) = open_claim(
      &h.state,
      &token,
      json!({ "listingId": listing_id, "method": "phone", "phone": "+31 20 123 4567" }),
    )
    .await;
    let claim_id = body["claim"]["claimId"].as_str().unwrap().to_owned();

    let (status, body, _) = send(
      &h.state,
      "POST",
      &format!("/claims/{claim_id}/verify"),
      vec![(header::AUTHORIZATION, bearer(&token))],
      Some(json!({ "code": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Verificatiecode is verplicht.");

    let (status, ..) = send(
      &h.state,
      "POST",
      &format!("/claims/{claim_id}/verify"),
      vec![(header::AUTHORIZATION, bearer(&token))],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn another_users_claim_is_not_found() {
    let h = harness().await;
    let (_, owner) = create_user(&h.state, "eva@example.nl").await;
    let (_, intruder) = create_user(&h.state, "mallory@example.nl").await;
    let listing_id = create_listing(&h.state, "https://dekliniek.nl").await;
    let (_, body) = open_claim(
      &h.state,
      &owner,
      json!({ "listingId": listing_id, "method": "email_domain", "email": "info@dekliniek.nl" }),
    )
    .await;
    let claim_id = body["claim"]["claimId"].as_str().unwrap().to_owned();
    let code = h.outbox.code_for(&claim_id);

    let (status, body) = submit(&h.state, &intruder, &claim_id, &code, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Claim niet gevonden.");

    let (status, ..) = send(
      &h.state,
      "GET",
      &format!("/claims/{claim_id}"),
      vec![(header::AUTHORIZATION, bearer(&intruder))],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The owner's claim is untouched.
    let (status, body, _) = send(
      &h.state,
      "GET",
      &format!("/claims/{claim_id}"),
      vec![(header::AUTHORIZATION, bearer(&owner))],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attempts"], 0);
  }

  #[tokio::test]
  async fn second_open_claim_conflicts() {
    let h = harness().await;
    let (_, token) = create_user(&h.state, "eva@example.nl").await;
    let listing_id = create_listing(&h.state, "https://dekliniek.nl").await;
    let request =
      json!({ "listingId": listing_id, "method": "phone", "phone": "0201234567" });

    let (status, _) = open_claim(&h.state, &token, request.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = open_claim(&h.state, &token, request).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (status, body, _) = send(
      &h.state,
      "GET",
      "/claims",
      vec![(header::AUTHORIZATION, bearer(&token))],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn mismatched_email_domain_is_bad_request() {
    let h = harness().await;
    let (_, token) = create_user(&h.state, "eva@example.nl").await;
    let listing_id = create_listing(&h.state, "https://dekliniek.nl").await;
    let (status, _) = open_claim(
      &h.state,
      &token,
      json!({ "listingId": listing_id, "method": "email_domain", "email": "eva@gmail.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = open_claim(
      &h.state,
      &token,
      json!({ "listingId": Uuid::new_v4(), "method": "phone", "phone": "0201234567" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Locatie niet gevonden.");
  }

  #[tokio::test]
  async fn resend_issues_a_new_code() {
    let h = harness().await;
    let (_, token) = create_user(&h.state, "eva@example.nl").await;
    let listing_id = create_listing(&h.state, "https://dekliniek.nl").await;
    let (_, body) = open_claim(
      &h.state,
      &token,
      json!({ "listingId": listing_id, "method": "phone", "phone": "0201234567" }),
    )
    .await;
    let claim_id = body["claim"]["claimId"].as_str().unwrap().to_owned();

    let (status, body, _) = send(
      &h.state,
      "POST",
      &format!("/claims/{claim_id}/resend"),
      vec![(header::AUTHORIZATION, bearer(&token))],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["claim"]["status"], "verification_sent");
    assert_eq!(body["message"], "Er is een verificatiecode verstuurd.");
    assert_eq!(h.outbox.sent.lock().unwrap().len(), 2);

    let code = h.outbox.code_for(&claim_id);
    let (status, body) = submit(&h.state, &token, &claim_id, &code, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");
  }

  // ── Admin review ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn document_claim_waits_for_admin_approval() {
    let h = harness().await;
    let (user_id, token) = create_user(&h.state, "eva@example.nl").await;
    let listing_id = create_listing(&h.state, "https://dekliniek.nl").await;
    let (_, body) = open_claim(
      &h.state,
      &token,
      json!({ "listingId": listing_id, "method": "document" }),
    )
    .await;
    let claim_id = body["claim"]["claimId"].as_str().unwrap().to_owned();
    let code = h.outbox.code_for(&claim_id);

    let (status, body) = submit(&h.state, &token, &claim_id, &code, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "verified");
    assert!(body.get("businessId").is_none());
    assert!(body.get("redirectUrl").is_none());

    let (status, queue, _) = send(
      &h.state,
      "GET",
      "/admin/claims?status=verified",
      vec![(header::AUTHORIZATION, admin_auth())],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let queue = queue.as_array().unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0]["claimId"], claim_id.as_str());

    let (status, body, _) = send(
      &h.state,
      "POST",
      &format!("/admin/claims/{claim_id}/approve"),
      vec![(header::AUTHORIZATION, admin_auth())],
      Some(json!({ "notes": "KvK uittreksel gecontroleerd" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["claim"]["status"], "approved");
    assert_eq!(body["claim"]["adminNotes"], "KvK uittreksel gecontroleerd");
    assert_eq!(body["businessCreated"], true);

    let (_, listing, _) = send(
      &h.state,
      "GET",
      &format!("/admin/listings/{listing_id}"),
      vec![(header::AUTHORIZATION, admin_auth())],
      None,
    )
    .await;
    assert_eq!(listing["ownerId"], user_id.as_str());

    // Approving twice is a state error.
    let (status, ..) = send(
      &h.state,
      "POST",
      &format!("/admin/claims/{claim_id}/approve"),
      vec![(header::AUTHORIZATION, admin_auth())],
      Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn admin_can_reject_an_open_claim() {
    let h = harness().await;
    let (_, token) = create_user(&h.state, "eva@example.nl").await;
    let listing_id = create_listing(&h.state, "https://dekliniek.nl").await;
    let (_, body) = open_claim(
      &h.state,
      &token,
      json!({ "listingId": listing_id, "method": "manual" }),
    )
    .await;
    let claim_id = body["claim"]["claimId"].as_str().unwrap().to_owned();

    let (status, body, _) = send(
      &h.state,
      "POST",
      &format!("/admin/claims/{claim_id}/reject"),
      vec![(header::AUTHORIZATION, admin_auth())],
      Some(json!({ "notes": "geen bewijs" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");

    let code = h.outbox.code_for(&claim_id);
    let (status, _) = submit(&h.state, &token, &claim_id, &code, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, ..) = send(
      &h.state,
      "POST",
      &format!("/admin/claims/{}/reject", Uuid::new_v4()),
      vec![(header::AUTHORIZATION, admin_auth())],
      Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn expire_sweep_reports_count() {
    let h = harness().await;
    let (_, token) = create_user(&h.state, "eva@example.nl").await;
    let listing_id = create_listing(&h.state, "https://dekliniek.nl").await;
    open_claim(
      &h.state,
      &token,
      json!({ "listingId": listing_id, "method": "phone", "phone": "0201234567" }),
    )
    .await;

    let (status, body, _) = send(
      &h.state,
      "POST",
      "/admin/claims/expire",
      vec![(header::AUTHORIZATION, admin_auth())],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expired"], 0);
  }

  #[tokio::test]
  async fn unknown_listing_is_not_found() {
    let h = harness().await;
    let (status, body, _) = send(
      &h.state,
      "GET",
      &format!("/admin/listings/{}", Uuid::new_v4()),
      vec![(header::AUTHORIZATION, admin_auth())],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Locatie niet gevonden.");
  }

  #[tokio::test]
  async fn duplicate_email_conflicts() {
    let h = harness().await;
    let (user_id, token) = create_user(&h.state, "eva@example.nl").await;

    let (status, body, _) = send(
      &h.state,
      "POST",
      "/admin/users",
      vec![(header::AUTHORIZATION, admin_auth())],
      Some(json!({ "email": " eva@example.nl ", "displayName": "Someone else" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Dit e-mailadres is al in gebruik.");
    assert!(body.get("token").is_none());

    // The first account and its token are untouched.
    let (status, me, _) = send(
      &h.state,
      "GET",
      "/me",
      vec![(header::AUTHORIZATION, bearer(&token))],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["userId"], user_id.as_str());
    assert_eq!(me["displayName"], "Test");
  }

  #[tokio::test]
  async fn review_notes_are_optional() {
    let h = harness().await;
    let (_, eva) = create_user(&h.state, "eva@example.nl").await;
    let (_, tim) = create_user(&h.state, "tim@example.nl").await;
    let kliniek = create_listing(&h.state, "https://dekliniek.nl").await;
    let salon = create_listing(&h.state, "https://trimsalon.nl").await;

    let (_, body) = open_claim(
      &h.state,
      &eva,
      json!({ "listingId": kliniek, "method": "document" }),
    )
    .await;
    let approve_id = body["claim"]["claimId"].as_str().unwrap().to_owned();
    let code = h.outbox.code_for(&approve_id);
    submit(&h.state, &eva, &approve_id, &code, None).await;

    let (status, body, _) = send(
      &h.state,
      "POST",
      &format!("/admin/claims/{approve_id}/approve"),
      vec![(header::AUTHORIZATION, admin_auth())],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["claim"]["status"], "approved");
    assert_eq!(body["claim"]["adminNotes"], "approved by admin");

    let (_, body) = open_claim(
      &h.state,
      &tim,
      json!({ "listingId": salon, "method": "manual" }),
    )
    .await;
    let reject_id = body["claim"]["claimId"].as_str().unwrap().to_owned();
    let (status, body, _) = send(
      &h.state,
      "POST",
      &format!("/admin/claims/{reject_id}/reject"),
      vec![(header::AUTHORIZATION, admin_auth())],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");
  }

  #[tokio::test]
  async fn malformed_admin_bodies_get_a_json_error() {
    let h = harness().await;
    for uri in ["/admin/users", "/admin/listings"] {
      let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, admin_auth())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\":"))
        .unwrap();
      let resp = api_router(h.state.clone()).oneshot(req).await.unwrap();
      assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
      let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
      let body: Value = serde_json::from_slice(&bytes).unwrap();
      assert!(body["error"].is_string(), "{uri}");
    }

    let claim_id = Uuid::new_v4();
    let req = Request::builder()
      .method("POST")
      .uri(format!("/admin/claims/{claim_id}/approve"))
      .header(header::AUTHORIZATION, admin_auth())
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from("notes"))
      .unwrap();
    let resp = api_router(h.state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }
}
