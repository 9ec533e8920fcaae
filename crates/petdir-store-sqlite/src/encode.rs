//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that SQL string comparison orders them
//! chronologically. UUIDs are stored as hyphenated lowercase strings. Enums
//! use their snake_case/lowercase text form.

use chrono::{DateTime, SecondsFormat, Utc};
use petdir_core::{
  claim::{Claim, ClaimStatus, VerificationMethod},
  directory::{Business, Listing, PlanTier, Role, User},
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "user_id, email, display_name, role, created_at";

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:      String,
  pub email:        String,
  pub display_name: Option<String>,
  pub role:         String,
  pub created_at:   String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:      row.get(0)?,
      email:        row.get(1)?,
      display_name: row.get(2)?,
      role:         row.get(3)?,
      created_at:   row.get(4)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:      decode_uuid(&self.user_id)?,
      email:        self.email,
      display_name: self.display_name,
      role:         Role::decode(&self.role)?,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

pub const PLACE_COLUMNS: &str =
  "place_id, name, website, owner_id, business_id, created_at, updated_at";

/// Raw strings read directly from a `places` row.
pub struct RawListing {
  pub place_id:    String,
  pub name:        String,
  pub website:     Option<String>,
  pub owner_id:    Option<String>,
  pub business_id: Option<String>,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawListing {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      place_id:    row.get(0)?,
      name:        row.get(1)?,
      website:     row.get(2)?,
      owner_id:    row.get(3)?,
      business_id: row.get(4)?,
      created_at:  row.get(5)?,
      updated_at:  row.get(6)?,
    })
  }

  pub fn into_listing(self) -> Result<Listing> {
    Ok(Listing {
      listing_id:  decode_uuid(&self.place_id)?,
      name:        self.name,
      website:     self.website,
      owner_id:    decode_opt_uuid(self.owner_id)?,
      business_id: decode_opt_uuid(self.business_id)?,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

pub const BUSINESS_COLUMNS: &str =
  "business_id, owner_id, name, contact_email, contact_phone, plan, created_at";

/// Raw strings read directly from a `businesses` row.
pub struct RawBusiness {
  pub business_id:   String,
  pub owner_id:      String,
  pub name:          String,
  pub contact_email: String,
  pub contact_phone: Option<String>,
  pub plan:          String,
  pub created_at:    String,
}

impl RawBusiness {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      business_id:   row.get(0)?,
      owner_id:      row.get(1)?,
      name:          row.get(2)?,
      contact_email: row.get(3)?,
      contact_phone: row.get(4)?,
      plan:          row.get(5)?,
      created_at:    row.get(6)?,
    })
  }

  pub fn into_business(self) -> Result<Business> {
    Ok(Business {
      business_id:   decode_uuid(&self.business_id)?,
      owner_id:      decode_uuid(&self.owner_id)?,
      name:          self.name,
      contact_email: self.contact_email,
      contact_phone: self.contact_phone,
      plan:          PlanTier::decode(&self.plan)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub const CLAIM_COLUMNS: &str = "claim_id, place_id, user_id, status, method,
   verification_email, verification_phone, verification_code,
   code_issued_at, code_expires_at, attempts, verified_at, reviewed_at,
   admin_notes, created_at, updated_at";

/// Raw strings read directly from a `claims` row.
pub struct RawClaim {
  pub claim_id:           String,
  pub place_id:           String,
  pub user_id:            String,
  pub status:             String,
  pub method:             String,
  pub verification_email: Option<String>,
  pub verification_phone: Option<String>,
  pub verification_code:  Option<String>,
  pub code_issued_at:     Option<String>,
  pub code_expires_at:    Option<String>,
  pub attempts:           u32,
  pub verified_at:        Option<String>,
  pub reviewed_at:        Option<String>,
  pub admin_notes:        Option<String>,
  pub created_at:         String,
  pub updated_at:         String,
}

impl RawClaim {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      claim_id:           row.get(0)?,
      place_id:           row.get(1)?,
      user_id:            row.get(2)?,
      status:             row.get(3)?,
      method:             row.get(4)?,
      verification_email: row.get(5)?,
      verification_phone: row.get(6)?,
      verification_code:  row.get(7)?,
      code_issued_at:     row.get(8)?,
      code_expires_at:    row.get(9)?,
      attempts:           row.get(10)?,
      verified_at:        row.get(11)?,
      reviewed_at:        row.get(12)?,
      admin_notes:        row.get(13)?,
      created_at:         row.get(14)?,
      updated_at:         row.get(15)?,
    })
  }

  pub fn into_claim(self) -> Result<Claim> {
    Ok(Claim {
      claim_id:           decode_uuid(&self.claim_id)?,
      listing_id:         decode_uuid(&self.place_id)?,
      user_id:            decode_uuid(&self.user_id)?,
      status:             ClaimStatus::decode(&self.status)?,
      method:             VerificationMethod::decode(&self.method)?,
      verification_email: self.verification_email,
      verification_phone: self.verification_phone,
      verification_code:  self.verification_code,
      code_issued_at:     decode_opt_dt(self.code_issued_at)?,
      code_expires_at:    decode_opt_dt(self.code_expires_at)?,
      attempts:           self.attempts,
      verified_at:        decode_opt_dt(self.verified_at)?,
      reviewed_at:        decode_opt_dt(self.reviewed_at)?,
      admin_notes:        self.admin_notes,
      created_at:         decode_dt(&self.created_at)?,
      updated_at:         decode_dt(&self.updated_at)?,
    })
  }
}
