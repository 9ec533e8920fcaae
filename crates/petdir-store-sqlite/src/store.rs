//! [`SqliteStore`]: the SQLite implementation of [`DirectoryStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use petdir_core::{
  claim::{Claim, ClaimStatus, CodeIssue, MAX_ATTEMPTS, NewClaim},
  directory::{Business, Listing, NewListing, NewUser, PlanTier, User},
  store::{
    Approval, ApprovalOutcome, AttemptRecord, ClaimQuery, DirectoryStore,
    Provisioned,
  },
};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    BUSINESS_COLUMNS, CLAIM_COLUMNS, PLACE_COLUMNS, RawBusiness, RawClaim,
    RawListing, RawUser, USER_COLUMNS, decode_uuid, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A petdir directory store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers (run on the connection thread) ──────────────────────────────

fn select_claim(
  conn: &rusqlite::Connection,
  claim_id: &str,
) -> rusqlite::Result<Option<RawClaim>> {
  conn
    .query_row(
      &format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE claim_id = ?1"),
      rusqlite::params![claim_id],
      RawClaim::from_row,
    )
    .optional()
}

/// Raw result of the approval transaction, decoded off the connection thread.
enum RawApproval {
  Approved {
    claim:       RawClaim,
    business_id: String,
    created:     bool,
  },
  ClaimNotFound,
  NotVerified(String),
  UserNotFound,
  ListingNotFound,
  ListingOwned(String),
}

// ─── DirectoryStore impl ─────────────────────────────────────────────────────

impl DirectoryStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser, token_hash: String) -> Result<Option<User>> {
    let user = User {
      user_id:      Uuid::new_v4(),
      email:        input.email.trim().to_owned(),
      display_name: input.display_name,
      role:         input.role,
      created_at:   Utc::now(),
    };

    let id_str   = encode_uuid(user.user_id);
    let email    = user.email.clone();
    let name     = user.display_name.clone();
    let role_str = user.role.as_ref().to_owned();
    let at_str   = encode_dt(user.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO users (user_id, email, display_name, role, token_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (email) DO NOTHING",
          rusqlite::params![id_str, email, name, role_str, token_hash, at_str],
        )?)
      })
      .await?;

    Ok((inserted == 1).then_some(user))
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
            rusqlite::params![id_str],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_user_by_token(&self, token_hash: &str) -> Result<Option<User>> {
    let hash = token_hash.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE token_hash = ?1"),
            rusqlite::params![hash],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  // ── Listings and businesses ───────────────────────────────────────────────

  async fn add_listing(&self, input: NewListing) -> Result<Listing> {
    let now = Utc::now();
    let listing = Listing {
      listing_id:  Uuid::new_v4(),
      name:        input.name,
      website:     input.website,
      owner_id:    None,
      business_id: None,
      created_at:  now,
      updated_at:  now,
    };

    let id_str  = encode_uuid(listing.listing_id);
    let name    = listing.name.clone();
    let website = listing.website.clone();
    let at_str  = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO places (place_id, name, website, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?4)",
          rusqlite::params![id_str, name, website, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(listing)
  }

  async fn get_listing(&self, id: Uuid) -> Result<Option<Listing>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawListing> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PLACE_COLUMNS} FROM places WHERE place_id = ?1"),
            rusqlite::params![id_str],
            RawListing::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawListing::into_listing).transpose()
  }

  async fn find_business_by_owner(&self, owner_id: Uuid) -> Result<Option<Business>> {
    let id_str = encode_uuid(owner_id);

    let raw: Option<RawBusiness> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {BUSINESS_COLUMNS} FROM businesses
               WHERE owner_id = ?1
               ORDER BY created_at, business_id
               LIMIT 1"
            ),
            rusqlite::params![id_str],
            RawBusiness::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawBusiness::into_business).transpose()
  }

  // ── Claims ────────────────────────────────────────────────────────────────

  async fn create_claim(&self, input: NewClaim) -> Result<Claim> {
    let now = Utc::now();
    let claim = Claim {
      claim_id:           Uuid::new_v4(),
      listing_id:         input.listing_id,
      user_id:            input.user_id,
      status:             ClaimStatus::Pending,
      method:             input.method,
      verification_email: input.verification_email,
      verification_phone: input.verification_phone,
      verification_code:  None,
      code_issued_at:     None,
      code_expires_at:    None,
      attempts:           0,
      verified_at:        None,
      reviewed_at:        None,
      admin_notes:        None,
      created_at:         now,
      updated_at:         now,
    };

    let claim_id_str = encode_uuid(claim.claim_id);
    let place_id_str = encode_uuid(claim.listing_id);
    let user_id_str  = encode_uuid(claim.user_id);
    let status_str   = claim.status.as_ref().to_owned();
    let method_str   = claim.method.as_ref().to_owned();
    let email        = claim.verification_email.clone();
    let phone        = claim.verification_phone.clone();
    let at_str       = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO claims (
             claim_id, place_id, user_id, status, method,
             verification_email, verification_phone, attempts,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?8)",
          rusqlite::params![
            claim_id_str,
            place_id_str,
            user_id_str,
            status_str,
            method_str,
            email,
            phone,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(claim)
  }

  async fn get_claim(&self, id: Uuid) -> Result<Option<Claim>> {
    let id_str = encode_uuid(id);

    let raw = self
      .conn
      .call(move |conn| Ok(select_claim(conn, &id_str)?))
      .await?;

    raw.map(RawClaim::into_claim).transpose()
  }

  async fn list_claims(&self, query: &ClaimQuery) -> Result<Vec<Claim>> {
    let mut conds: Vec<String> = vec![];
    let mut args: Vec<String> = vec![];

    if let Some(user_id) = query.user_id {
      args.push(encode_uuid(user_id));
      conds.push(format!("user_id = ?{}", args.len()));
    }
    if let Some(listing_id) = query.listing_id {
      args.push(encode_uuid(listing_id));
      conds.push(format!("place_id = ?{}", args.len()));
    }
    if !query.statuses.is_empty() {
      let placeholders: Vec<String> = query
        .statuses
        .iter()
        .map(|status| {
          args.push(status.as_ref().to_owned());
          format!("?{}", args.len())
        })
        .collect();
      conds.push(format!("status IN ({})", placeholders.join(", ")));
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };

    let raws: Vec<RawClaim> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {CLAIM_COLUMNS} FROM claims
           {where_clause}
           ORDER BY created_at DESC, claim_id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(args.iter()), RawClaim::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawClaim::into_claim).collect()
  }

  async fn issue_code(&self, claim_id: Uuid, issue: CodeIssue) -> Result<Option<Claim>> {
    let id_str         = encode_uuid(claim_id);
    let issued_at_str  = encode_dt(issue.issued_at);
    let expires_at_str = encode_dt(issue.expires_at);
    let code           = issue.code;

    let raw: Option<RawClaim> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "UPDATE claims
               SET status            = 'verification_sent',
                   verification_code = ?2,
                   code_issued_at    = ?3,
                   code_expires_at   = ?4,
                   updated_at        = ?3
               WHERE claim_id = ?1
                 AND status IN ('pending', 'verification_sent')
                 AND attempts < ?5
               RETURNING {CLAIM_COLUMNS}"
            ),
            rusqlite::params![id_str, code, issued_at_str, expires_at_str, MAX_ATTEMPTS],
            RawClaim::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawClaim::into_claim).transpose()
  }

  async fn record_attempt(
    &self,
    claim_id:      Uuid,
    expected_code: String,
    matched:       bool,
    at:            DateTime<Utc>,
  ) -> Result<Option<AttemptRecord>> {
    let id_str = encode_uuid(claim_id);
    let at_str = encode_dt(at);

    // The guard re-checks everything `Claim::check_code` looked at, so a
    // concurrent submission can neither push attempts past the ceiling nor
    // verify against a code that has since been replaced.
    let row: Option<(u32, String)> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "UPDATE claims
             SET attempts    = attempts + 1,
                 status      = CASE WHEN ?3 THEN 'verified' ELSE status END,
                 verified_at = CASE WHEN ?3 THEN ?4 ELSE verified_at END,
                 updated_at  = ?4
             WHERE claim_id = ?1
               AND status = 'verification_sent'
               AND verification_code = ?2
               AND code_expires_at > ?4
               AND attempts < ?5
             RETURNING attempts, status",
            rusqlite::params![id_str, expected_code, matched, at_str, MAX_ATTEMPTS],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?)
      })
      .await?;

    row
      .map(|(attempts, status)| {
        Ok(AttemptRecord { attempts, status: ClaimStatus::decode(&status)? })
      })
      .transpose()
  }

  async fn approve_claim(&self, approval: Approval) -> Result<ApprovalOutcome> {
    let claim_id_str    = encode_uuid(approval.claim_id);
    let at_str          = encode_dt(approval.reviewed_at);
    let notes           = approval.notes;
    let new_business_id = encode_uuid(Uuid::new_v4());
    let free_plan       = PlanTier::Free.as_ref().to_owned();

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(claim) = select_claim(&tx, &claim_id_str)? else {
          return Ok(RawApproval::ClaimNotFound);
        };
        if claim.status != "verified" {
          return Ok(RawApproval::NotVerified(claim.status));
        }

        let user_email: Option<String> = tx
          .query_row(
            "SELECT email FROM users WHERE user_id = ?1",
            rusqlite::params![claim.user_id],
            |r| r.get(0),
          )
          .optional()?;
        let Some(user_email) = user_email else {
          return Ok(RawApproval::UserNotFound);
        };

        let place: Option<(String, Option<String>)> = tx
          .query_row(
            "SELECT name, owner_id FROM places WHERE place_id = ?1",
            rusqlite::params![claim.place_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;
        let Some((place_name, place_owner)) = place else {
          return Ok(RawApproval::ListingNotFound);
        };
        if let Some(owner) = place_owner
          && owner != claim.user_id
        {
          return Ok(RawApproval::ListingOwned(owner));
        }

        // 1. Claim → approved.
        tx.execute(
          "UPDATE claims
           SET status = 'approved', reviewed_at = ?2, admin_notes = ?3, updated_at = ?2
           WHERE claim_id = ?1 AND status = 'verified'",
          rusqlite::params![claim_id_str, at_str, notes],
        )?;

        // 2. Reuse the claimant's business or create one on the free plan.
        let existing: Option<String> = tx
          .query_row(
            "SELECT business_id FROM businesses
             WHERE owner_id = ?1
             ORDER BY created_at, business_id
             LIMIT 1",
            rusqlite::params![claim.user_id],
            |r| r.get(0),
          )
          .optional()?;
        let (business_id, created) = match existing {
          Some(id) => (id, false),
          None => {
            let contact_email = claim.verification_email.clone().unwrap_or(user_email);
            tx.execute(
              "INSERT INTO businesses (
                 business_id, owner_id, name, contact_email, contact_phone,
                 plan, created_at, updated_at
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
              rusqlite::params![
                new_business_id,
                claim.user_id,
                place_name,
                contact_email,
                claim.verification_phone,
                free_plan,
                at_str,
              ],
            )?;
            (new_business_id, true)
          }
        };

        // 3. Link the listing.
        tx.execute(
          "UPDATE places SET business_id = ?2, owner_id = ?3, updated_at = ?4
           WHERE place_id = ?1",
          rusqlite::params![claim.place_id, business_id, claim.user_id, at_str],
        )?;

        // 4. Promote the claimant; admins keep their role.
        tx.execute(
          "UPDATE users SET role = 'business' WHERE user_id = ?1 AND role = 'user'",
          rusqlite::params![claim.user_id],
        )?;

        let Some(claim) = select_claim(&tx, &claim_id_str)? else {
          return Ok(RawApproval::ClaimNotFound);
        };
        tx.commit()?;

        Ok(RawApproval::Approved { claim, business_id, created })
      })
      .await?;

    Ok(match raw {
      RawApproval::Approved { claim, business_id, created } => {
        ApprovalOutcome::Approved(Provisioned {
          claim:            claim.into_claim()?,
          business_id:      decode_uuid(&business_id)?,
          business_created: created,
        })
      }
      RawApproval::ClaimNotFound => ApprovalOutcome::ClaimNotFound,
      RawApproval::NotVerified(status) => {
        ApprovalOutcome::NotVerified(ClaimStatus::decode(&status)?)
      }
      RawApproval::UserNotFound => ApprovalOutcome::UserNotFound,
      RawApproval::ListingNotFound => ApprovalOutcome::ListingNotFound,
      RawApproval::ListingOwned(owner) => {
        ApprovalOutcome::ListingOwned { owner_id: decode_uuid(&owner)? }
      }
    })
  }

  async fn reject_claim(
    &self,
    claim_id: Uuid,
    notes:    Option<String>,
    at:       DateTime<Utc>,
  ) -> Result<Option<Claim>> {
    let id_str = encode_uuid(claim_id);
    let at_str = encode_dt(at);

    let raw: Option<RawClaim> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "UPDATE claims
               SET status      = 'rejected',
                   reviewed_at = ?2,
                   admin_notes = COALESCE(?3, admin_notes),
                   updated_at  = ?2
               WHERE claim_id = ?1
                 AND status NOT IN ('approved', 'rejected', 'expired')
               RETURNING {CLAIM_COLUMNS}"
            ),
            rusqlite::params![id_str, at_str, notes],
            RawClaim::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawClaim::into_claim).transpose()
  }

  async fn expire_claims(&self, now: DateTime<Utc>) -> Result<u64> {
    let now_str = encode_dt(now);

    let touched = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE claims
           SET status = 'expired', updated_at = ?1
           WHERE status IN ('pending', 'verification_sent')
             AND code_expires_at IS NOT NULL
             AND code_expires_at <= ?1",
          rusqlite::params![now_str],
        )?)
      })
      .await?;

    if touched > 0 {
      tracing::debug!(touched, "claims expired");
    }
    Ok(touched as u64)
  }
}
