//! Claims: a user's assertion of ownership over a directory listing.
//!
//! A claim moves strictly forward along
//! `pending → verification_sent → verified → approved`, and may divert to
//! `rejected` or `expired` at any point before it is approved. Verification is
//! done with a short-lived numeric code limited to [`MAX_ATTEMPTS`] tries.

use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

/// Ceiling on code submissions per claim. Successful submissions count too.
pub const MAX_ATTEMPTS: u32 = 5;

/// Number of digits in an issued verification code.
pub const CODE_LENGTH: usize = 6;

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  EnumString,
  AsRefStr,
  Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClaimStatus {
  Pending,
  VerificationSent,
  Verified,
  Approved,
  Rejected,
  Expired,
}

impl ClaimStatus {
  /// Parse the text stored in the `status` column.
  pub fn decode(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownStatus(s.to_owned()))
  }

  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Approved | Self::Rejected | Self::Expired)
  }

  /// Statuses that block a second claim on the same listing by the same user.
  pub fn is_open(self) -> bool { !self.is_terminal() }

  /// A code may be (re)issued before the claim has been verified.
  pub fn accepts_code_issue(self) -> bool {
    matches!(self, Self::Pending | Self::VerificationSent)
  }

  /// Whether `self → next` is a legal lifecycle step.
  pub fn can_transition_to(self, next: Self) -> bool {
    use ClaimStatus::*;
    match (self, next) {
      (Pending, VerificationSent)
      | (VerificationSent, Verified)
      | (Verified, Approved) => true,
      (from, Rejected | Expired) => !from.is_terminal(),
      _ => false,
    }
  }
}

// ─── Verification method ─────────────────────────────────────────────────────

/// How the claimant proves control over the listing.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  EnumString,
  AsRefStr,
  Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VerificationMethod {
  /// A code sent to an address on the listing website's domain.
  EmailDomain,
  /// A code sent by SMS or call to the listing's phone number.
  Phone,
  GoogleBusiness,
  Document,
  Manual,
}

impl VerificationMethod {
  pub fn decode(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownMethod(s.to_owned()))
  }

  /// Methods trusted enough to approve a claim without an admin.
  pub fn auto_approves(self) -> bool {
    match self {
      Self::EmailDomain | Self::Phone => true,
      Self::GoogleBusiness | Self::Document | Self::Manual => false,
    }
  }
}

// ─── Claim ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
  pub claim_id:           Uuid,
  pub listing_id:         Uuid,
  pub user_id:            Uuid,
  pub status:             ClaimStatus,
  pub method:             VerificationMethod,
  pub verification_email: Option<String>,
  pub verification_phone: Option<String>,
  /// Never serialised; the code only travels through the notifier.
  #[serde(skip)]
  pub verification_code:  Option<String>,
  pub code_issued_at:     Option<DateTime<Utc>>,
  pub code_expires_at:    Option<DateTime<Utc>>,
  pub attempts:           u32,
  pub verified_at:        Option<DateTime<Utc>>,
  pub reviewed_at:        Option<DateTime<Utc>>,
  pub admin_notes:        Option<String>,
  pub created_at:         DateTime<Utc>,
  pub updated_at:         DateTime<Utc>,
}

/// The decision reached by comparing a submitted code against a claim,
/// before anything is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheck {
  /// Already `verified` or `approved`; nothing to do.
  AlreadyVerified,
  /// Not awaiting a code.
  WrongState(ClaimStatus),
  Expired,
  Exhausted,
  Mismatch,
  Match,
}

impl Claim {
  pub fn is_owned_by(&self, user_id: Uuid) -> bool { self.user_id == user_id }

  pub fn remaining_attempts(&self) -> u32 {
    MAX_ATTEMPTS.saturating_sub(self.attempts)
  }

  /// Classify a code submission. Checks run in a fixed order: status, expiry,
  /// attempt ceiling, then the (whitespace-trimmed) comparison.
  pub fn check_code(&self, submitted: &str, now: DateTime<Utc>) -> CodeCheck {
    match self.status {
      ClaimStatus::Verified | ClaimStatus::Approved => {
        return CodeCheck::AlreadyVerified;
      }
      ClaimStatus::VerificationSent => {}
      other => return CodeCheck::WrongState(other),
    }

    let (Some(code), Some(expires_at)) =
      (self.verification_code.as_deref(), self.code_expires_at)
    else {
      return CodeCheck::Expired;
    };

    if expires_at <= now {
      return CodeCheck::Expired;
    }
    if self.attempts >= MAX_ATTEMPTS {
      return CodeCheck::Exhausted;
    }

    if submitted.trim() == code {
      CodeCheck::Match
    } else {
      CodeCheck::Mismatch
    }
  }
}

/// Input to [`crate::store::DirectoryStore::create_claim`].
#[derive(Debug, Clone)]
pub struct NewClaim {
  pub listing_id:         Uuid,
  pub user_id:            Uuid,
  pub method:             VerificationMethod,
  pub verification_email: Option<String>,
  pub verification_phone: Option<String>,
}

/// A freshly generated code and its validity window.
#[derive(Debug, Clone)]
pub struct CodeIssue {
  pub code:       String,
  pub issued_at:  DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

/// Generate a zero-padded numeric code of [`CODE_LENGTH`] digits.
pub fn generate_code() -> String {
  generate_code_with(&mut OsRng)
}

pub fn generate_code_with<R: RngCore + ?Sized>(rng: &mut R) -> String {
  let value = rng.next_u32() % 10u32.pow(CODE_LENGTH as u32);
  format!("{value:0width$}", width = CODE_LENGTH)
}
