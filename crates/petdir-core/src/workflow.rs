//! The claim workflow: initiation, code issue, verification, auto-approval
//! and admin review, written against [`DirectoryStore`].

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  claim::{
    Claim, ClaimStatus, CodeCheck, CodeIssue, NewClaim, VerificationMethod,
    generate_code,
  },
  directory::User,
  store::{Approval, ApprovalOutcome, ClaimQuery, DirectoryStore, Provisioned},
};

/// How often a lost conditional write is re-read and retried before giving up.
const MAX_RACE_RETRIES: usize = 3;

// ─── Settings and seams ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ClaimSettings {
  /// How long an issued code stays valid.
  pub code_ttl:       TimeDelta,
  /// Where an auto-approved claimant is sent next.
  pub dashboard_path: String,
}

impl Default for ClaimSettings {
  fn default() -> Self {
    Self {
      code_ttl:       TimeDelta::minutes(60),
      dashboard_path: "/dashboard".to_owned(),
    }
  }
}

/// Where a verification code is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
  Email(String),
  Phone(String),
}

/// A code on its way to the claimant.
#[derive(Debug, Clone)]
pub struct CodeDelivery<'a> {
  pub claim:       &'a Claim,
  pub destination: Destination,
  pub code:        &'a str,
}

/// Hands issued codes to whatever delivers them (mail, SMS, a log).
pub trait CodeNotifier: Send + Sync {
  fn deliver(&self, delivery: &CodeDelivery<'_>);
}

// ─── Errors and outcomes ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ClaimError {
  /// Missing, or belonging to another user.
  #[error("claim not found")]
  NotFound,

  #[error("listing not found")]
  ListingNotFound,

  #[error("user not found")]
  UserNotFound,

  #[error("claim cannot be verified in status {0}")]
  InvalidState(ClaimStatus),

  #[error("verification code expired")]
  Expired,

  #[error("verification attempts exhausted")]
  AttemptsExhausted,

  #[error("invalid verification code, {remaining} attempts remaining")]
  InvalidCode { remaining: u32 },

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("invalid input: {0}")]
  BadInput(String),

  /// `now + code_ttl` does not fit in a timestamp.
  #[error("code expiry out of range: issued at {issued_at}, ttl {ttl}")]
  ExpiryOutOfRange { issued_at: DateTime<Utc>, ttl: TimeDelta },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ClaimError {
  fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type ClaimResult<T> = std::result::Result<T, ClaimError>;

/// Successful result of [`ClaimWorkflow::verify`].
#[derive(Debug, Clone)]
pub enum VerifyOutcome {
  /// Nothing was written.
  AlreadyVerified { status: ClaimStatus },
  /// Trusted method: ownership provisioned.
  Approved {
    claim:        Claim,
    business_id:  Uuid,
    redirect_url: String,
  },
  /// Untrusted method: left `verified` for an admin.
  AwaitingReview { claim: Claim },
}

impl VerifyOutcome {
  pub fn status(&self) -> ClaimStatus {
    match self {
      Self::AlreadyVerified { status } => *status,
      Self::Approved { .. } => ClaimStatus::Approved,
      Self::AwaitingReview { .. } => ClaimStatus::Verified,
    }
  }
}

/// Input to [`ClaimWorkflow::initiate`].
#[derive(Debug, Clone)]
pub struct ClaimRequest {
  pub listing_id: Uuid,
  pub method:     VerificationMethod,
  pub email:      Option<String>,
  pub phone:      Option<String>,
}

// ─── Workflow ────────────────────────────────────────────────────────────────

/// Borrowed view over everything a claim operation needs.
pub struct ClaimWorkflow<'a, S> {
  pub store:    &'a S,
  pub notifier: &'a dyn CodeNotifier,
  pub settings: &'a ClaimSettings,
}

impl<'a, S: DirectoryStore> ClaimWorkflow<'a, S> {
  pub fn new(
    store: &'a S,
    notifier: &'a dyn CodeNotifier,
    settings: &'a ClaimSettings,
  ) -> Self {
    Self { store, notifier, settings }
  }

  /// Fetch a claim the acting user owns.
  pub async fn owned_claim(&self, user_id: Uuid, claim_id: Uuid) -> ClaimResult<Claim> {
    self
      .store
      .get_claim(claim_id)
      .await
      .map_err(ClaimError::store)?
      .filter(|c| c.is_owned_by(user_id))
      .ok_or(ClaimError::NotFound)
  }

  /// Open a claim on a listing and send its first code.
  pub async fn initiate(
    &self,
    user: &User,
    request: ClaimRequest,
    now: DateTime<Utc>,
  ) -> ClaimResult<Claim> {
    self.code_expiry(now)?;

    let listing = self
      .store
      .get_listing(request.listing_id)
      .await
      .map_err(ClaimError::store)?
      .ok_or(ClaimError::ListingNotFound)?;

    if listing.is_owned() {
      return Err(ClaimError::Conflict(format!(
        "listing {} has already been claimed",
        listing.listing_id
      )));
    }

    let email = request.email.map(|e| e.trim().to_owned()).filter(|e| !e.is_empty());
    let phone = request.phone.map(|p| p.trim().to_owned()).filter(|p| !p.is_empty());

    match request.method {
      VerificationMethod::EmailDomain => match &email {
        Some(e) if listing.accepts_email_domain(e) => {}
        Some(e) => {
          return Err(ClaimError::BadInput(format!(
            "{e} is not an address on the listing's website domain"
          )));
        }
        None => {
          return Err(ClaimError::BadInput(
            "email_domain verification requires an email address".into(),
          ));
        }
      },
      VerificationMethod::Phone => {
        if phone.is_none() {
          return Err(ClaimError::BadInput(
            "phone verification requires a phone number".into(),
          ));
        }
      }
      VerificationMethod::GoogleBusiness
      | VerificationMethod::Document
      | VerificationMethod::Manual => {}
    }

    let open = self
      .store
      .list_claims(&ClaimQuery {
        user_id:    Some(user.user_id),
        listing_id: Some(listing.listing_id),
        statuses:   vec![
          ClaimStatus::Pending,
          ClaimStatus::VerificationSent,
          ClaimStatus::Verified,
        ],
      })
      .await
      .map_err(ClaimError::store)?;
    if let Some(existing) = open.first() {
      return Err(ClaimError::Conflict(format!(
        "claim {} for this listing is still open",
        existing.claim_id
      )));
    }

    let claim = self
      .store
      .create_claim(NewClaim {
        listing_id:         listing.listing_id,
        user_id:            user.user_id,
        method:             request.method,
        verification_email: email,
        verification_phone: phone,
      })
      .await
      .map_err(ClaimError::store)?;

    tracing::info!(
      claim_id = %claim.claim_id,
      listing_id = %listing.listing_id,
      method = %claim.method,
      "claim opened"
    );

    self.issue_code(user, claim, now).await
  }

  /// Send a fresh code for an unverified claim. Attempts are not reset.
  pub async fn resend(
    &self,
    user: &User,
    claim_id: Uuid,
    now: DateTime<Utc>,
  ) -> ClaimResult<Claim> {
    let claim = self.owned_claim(user.user_id, claim_id).await?;
    self.issue_code(user, claim, now).await
  }

  fn code_expiry(&self, now: DateTime<Utc>) -> ClaimResult<DateTime<Utc>> {
    let ttl = self.settings.code_ttl;
    now
      .checked_add_signed(ttl)
      .ok_or(ClaimError::ExpiryOutOfRange { issued_at: now, ttl })
  }

  async fn issue_code(
    &self,
    user: &User,
    claim: Claim,
    now: DateTime<Utc>,
  ) -> ClaimResult<Claim> {
    if !claim.status.accepts_code_issue() {
      return Err(ClaimError::InvalidState(claim.status));
    }
    if claim.remaining_attempts() == 0 {
      return Err(ClaimError::AttemptsExhausted);
    }

    let expires_at = self.code_expiry(now)?;

    let code = generate_code();
    let issued = self
      .store
      .issue_code(claim.claim_id, CodeIssue {
        code: code.clone(),
        issued_at: now,
        expires_at,
      })
      .await
      .map_err(ClaimError::store)?;

    let Some(claim) = issued else {
      let current = self.owned_claim(user.user_id, claim.claim_id).await?;
      return Err(if current.remaining_attempts() == 0 {
        ClaimError::AttemptsExhausted
      } else {
        ClaimError::InvalidState(current.status)
      });
    };

    let destination = match (claim.method, &claim.verification_phone) {
      (VerificationMethod::Phone, Some(phone)) => Destination::Phone(phone.clone()),
      _ => Destination::Email(
        claim
          .verification_email
          .clone()
          .unwrap_or_else(|| user.email.clone()),
      ),
    };

    self.notifier.deliver(&CodeDelivery {
      claim: &claim,
      destination,
      code: &code,
    });
    tracing::info!(claim_id = %claim.claim_id, "verification code issued");

    Ok(claim)
  }

  /// Check a submitted code and, on success, approve or park the claim.
  pub async fn verify(
    &self,
    user_id: Uuid,
    claim_id: Uuid,
    submitted: &str,
    now: DateTime<Utc>,
  ) -> ClaimResult<VerifyOutcome> {
    let mut claim = self.owned_claim(user_id, claim_id).await?;

    for _ in 0..MAX_RACE_RETRIES {
      let matched = match claim.check_code(submitted, now) {
        CodeCheck::AlreadyVerified => {
          return Ok(VerifyOutcome::AlreadyVerified { status: claim.status });
        }
        CodeCheck::WrongState(status) => return Err(ClaimError::InvalidState(status)),
        CodeCheck::Expired => return Err(ClaimError::Expired),
        CodeCheck::Exhausted => {
          tracing::warn!(%claim_id, "verification attempted after attempts exhausted");
          return Err(ClaimError::AttemptsExhausted);
        }
        CodeCheck::Mismatch => false,
        CodeCheck::Match => true,
      };

      // `check_code` only yields Match/Mismatch when a code is present.
      let expected = claim.verification_code.clone().unwrap_or_default();
      let record = self
        .store
        .record_attempt(claim_id, expected, matched, now)
        .await
        .map_err(ClaimError::store)?;

      match record {
        Some(record) if !matched => {
          let remaining = crate::claim::MAX_ATTEMPTS.saturating_sub(record.attempts);
          tracing::info!(%claim_id, attempts = record.attempts, "verification code rejected");
          return Err(ClaimError::InvalidCode { remaining });
        }
        Some(record) => {
          claim.status = record.status;
          claim.attempts = record.attempts;
          claim.verified_at = Some(now);
          tracing::info!(%claim_id, method = %claim.method, "claim verified");
          return self.after_verified(claim, now).await;
        }
        None => {
          // Another request changed the claim between read and write.
          claim = self.owned_claim(user_id, claim_id).await?;
        }
      }
    }

    Err(ClaimError::Conflict(format!(
      "claim {claim_id} is being modified concurrently"
    )))
  }

  async fn after_verified(
    &self,
    claim: Claim,
    now: DateTime<Utc>,
  ) -> ClaimResult<VerifyOutcome> {
    if !claim.method.auto_approves() {
      tracing::info!(claim_id = %claim.claim_id, "claim awaiting manual review");
      return Ok(VerifyOutcome::AwaitingReview { claim });
    }

    let notes = format!("auto-approved via {}", claim.method);
    match self.provision(claim.claim_id, notes, now).await {
      Ok(provisioned) => Ok(VerifyOutcome::Approved {
        business_id:  provisioned.business_id,
        claim:        provisioned.claim,
        redirect_url: self.settings.dashboard_path.clone(),
      }),
      Err(ClaimError::InvalidState(status)) => {
        Ok(VerifyOutcome::AlreadyVerified { status })
      }
      Err(e) => {
        tracing::warn!(
          claim_id = %claim.claim_id,
          error = %e,
          "auto-approval failed; claim left verified"
        );
        Err(e)
      }
    }
  }

  async fn provision(
    &self,
    claim_id: Uuid,
    notes: String,
    now: DateTime<Utc>,
  ) -> ClaimResult<Provisioned> {
    let outcome = self
      .store
      .approve_claim(Approval { claim_id, notes, reviewed_at: now })
      .await
      .map_err(ClaimError::store)?;

    match outcome {
      ApprovalOutcome::Approved(provisioned) => {
        tracing::info!(
          %claim_id,
          business_id = %provisioned.business_id,
          business_created = provisioned.business_created,
          "claim approved"
        );
        Ok(provisioned)
      }
      ApprovalOutcome::ClaimNotFound => Err(ClaimError::NotFound),
      ApprovalOutcome::NotVerified(status) => Err(ClaimError::InvalidState(status)),
      ApprovalOutcome::UserNotFound => Err(ClaimError::UserNotFound),
      ApprovalOutcome::ListingNotFound => Err(ClaimError::ListingNotFound),
      ApprovalOutcome::ListingOwned { owner_id } => Err(ClaimError::Conflict(
        format!("listing is already owned by user {owner_id}"),
      )),
    }
  }

  // ── Admin review ──────────────────────────────────────────────────────

  /// Approve a `verified` claim on an admin's say-so.
  pub async fn approve(
    &self,
    claim_id: Uuid,
    notes: Option<String>,
    now: DateTime<Utc>,
  ) -> ClaimResult<Provisioned> {
    let notes = notes.unwrap_or_else(|| "approved by admin".to_owned());
    self.provision(claim_id, notes, now).await
  }

  pub async fn reject(
    &self,
    claim_id: Uuid,
    notes: Option<String>,
    now: DateTime<Utc>,
  ) -> ClaimResult<Claim> {
    let rejected = self
      .store
      .reject_claim(claim_id, notes, now)
      .await
      .map_err(ClaimError::store)?;
    if let Some(claim) = rejected {
      tracing::info!(%claim_id, "claim rejected");
      return Ok(claim);
    }

    let current = self
      .store
      .get_claim(claim_id)
      .await
      .map_err(ClaimError::store)?
      .ok_or(ClaimError::NotFound)?;
    Err(ClaimError::InvalidState(current.status))
  }

  /// Expire open claims whose code lapsed before `now`.
  pub async fn expire_stale(&self, now: DateTime<Utc>) -> ClaimResult<u64> {
    let count = self.store.expire_claims(now).await.map_err(ClaimError::store)?;
    if count > 0 {
      tracing::info!(count, "expired stale claims");
    }
    Ok(count)
  }
}
