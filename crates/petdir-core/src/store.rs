//! The `DirectoryStore` trait and supporting query/outcome types.
//!
//! The trait is implemented by storage backends (e.g. `petdir-store-sqlite`).
//! The claim workflow and the HTTP layer depend on this abstraction, not on
//! any concrete backend.
//!
//! Writes that race with other requests are expressed as conditional
//! operations: they report "the row was not in the expected state" through
//! `Option`/outcome values instead of silently overwriting.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  claim::{Claim, ClaimStatus, CodeIssue, NewClaim},
  directory::{Business, Listing, NewListing, NewUser, User},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`DirectoryStore::list_claims`].
#[derive(Debug, Clone, Default)]
pub struct ClaimQuery {
  pub user_id:    Option<Uuid>,
  pub listing_id: Option<Uuid>,
  /// Empty means any status.
  pub statuses:   Vec<ClaimStatus>,
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// The row state after a conditional attempt write succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptRecord {
  pub attempts: u32,
  pub status:   ClaimStatus,
}

/// Input to [`DirectoryStore::approve_claim`].
#[derive(Debug, Clone)]
pub struct Approval {
  pub claim_id:    Uuid,
  pub notes:       String,
  pub reviewed_at: DateTime<Utc>,
}

/// What the provisioning transaction committed.
#[derive(Debug, Clone)]
pub struct Provisioned {
  pub claim:            Claim,
  pub business_id:      Uuid,
  /// `false` when the claimant's existing business was reused.
  pub business_created: bool,
}

/// Result of [`DirectoryStore::approve_claim`]. Every variant other than
/// `Approved` means the transaction was rolled back.
#[derive(Debug, Clone)]
pub enum ApprovalOutcome {
  Approved(Provisioned),
  ClaimNotFound,
  /// The claim was not in `verified` status.
  NotVerified(ClaimStatus),
  UserNotFound,
  ListingNotFound,
  /// Someone other than the claimant already owns the listing.
  ListingOwned { owner_id: Uuid },
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a petdir directory backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DirectoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a user together with the SHA-256 digest of their API token.
  /// `None` when the email address is already registered.
  fn add_user(
    &self,
    input: NewUser,
    token_hash: String,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look a user up by the digest of the bearer token they presented.
  fn find_user_by_token<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  // ── Listings and businesses ───────────────────────────────────────────

  fn add_listing(
    &self,
    input: NewListing,
  ) -> impl Future<Output = Result<Listing, Self::Error>> + Send + '_;

  fn get_listing(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Listing>, Self::Error>> + Send + '_;

  /// The oldest business owned by `owner_id`, if any.
  fn find_business_by_owner(
    &self,
    owner_id: Uuid,
  ) -> impl Future<Output = Result<Option<Business>, Self::Error>> + Send + '_;

  // ── Claims ────────────────────────────────────────────────────────────

  /// Create a claim in `pending` status with zero attempts.
  fn create_claim(
    &self,
    input: NewClaim,
  ) -> impl Future<Output = Result<Claim, Self::Error>> + Send + '_;

  fn get_claim(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Claim>, Self::Error>> + Send + '_;

  /// Claims matching `query`, newest first.
  fn list_claims<'a>(
    &'a self,
    query: &'a ClaimQuery,
  ) -> impl Future<Output = Result<Vec<Claim>, Self::Error>> + Send + 'a;

  /// Store a new code and move the claim to `verification_sent`.
  ///
  /// Only applies while the claim is `pending` or `verification_sent` with
  /// attempts below the ceiling; returns `None` otherwise. The attempt
  /// counter is left untouched.
  fn issue_code(
    &self,
    claim_id: Uuid,
    issue: CodeIssue,
  ) -> impl Future<Output = Result<Option<Claim>, Self::Error>> + Send + '_;

  /// Count one code submission, atomically.
  ///
  /// Applies only while the claim is `verification_sent`, its code is still
  /// `expected_code` and unexpired at `at`, and attempts are below the
  /// ceiling. When `matched` the claim also becomes `verified` with
  /// `verified_at = at`. Returns `None` when the guard failed.
  fn record_attempt(
    &self,
    claim_id: Uuid,
    expected_code: String,
    matched: bool,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<AttemptRecord>, Self::Error>> + Send + '_;

  /// Approve a `verified` claim and provision ownership in one transaction:
  /// claim status, business (created or reused), listing linkage and the
  /// claimant's role.
  fn approve_claim(
    &self,
    approval: Approval,
  ) -> impl Future<Output = Result<ApprovalOutcome, Self::Error>> + Send + '_;

  /// Reject a claim that is not yet terminal. Returns `None` when the claim
  /// does not exist or is already terminal.
  fn reject_claim(
    &self,
    claim_id: Uuid,
    notes: Option<String>,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Claim>, Self::Error>> + Send + '_;

  /// Move every `pending`/`verification_sent` claim whose code expired
  /// before `now` to `expired`. Returns the number of claims touched.
  fn expire_claims(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
