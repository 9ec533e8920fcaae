//! Directory entities touched by the claim workflow: users, listings and the
//! businesses that own them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Users ───────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  EnumString,
  AsRefStr,
  Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  #[default]
  User,
  /// Owns at least one approved listing.
  Business,
  Admin,
}

impl Role {
  pub fn decode(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownRole(s.to_owned()))
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub user_id:      Uuid,
  pub email:        String,
  pub display_name: Option<String>,
  pub role:         Role,
  pub created_at:   DateTime<Utc>,
}

/// Input to [`crate::store::DirectoryStore::add_user`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
  pub email:        String,
  pub display_name: Option<String>,
  #[serde(default)]
  pub role:         Role,
}

// ─── Listings ────────────────────────────────────────────────────────────────

/// A directory entry ("place") that can be claimed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
  pub listing_id:  Uuid,
  pub name:        String,
  pub website:     Option<String>,
  pub owner_id:    Option<Uuid>,
  pub business_id: Option<Uuid>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

impl Listing {
  pub fn is_owned(&self) -> bool { self.owner_id.is_some() }

  /// Host part of the website, lowercased and without a leading `www.`.
  pub fn website_host(&self) -> Option<String> {
    let website = self.website.as_deref()?.trim();
    let rest = website
      .split_once("://")
      .map_or(website, |(_, rest)| rest);
    let host = rest
      .split(['/', '?', '#'])
      .next()?
      .rsplit('@')
      .next()?
      .split(':')
      .next()?
      .to_ascii_lowercase();
    let host = host.strip_prefix("www.").map(str::to_owned).unwrap_or(host);
    (!host.is_empty()).then_some(host)
  }

  /// Whether `email` is an address on this listing's website domain.
  pub fn accepts_email_domain(&self, email: &str) -> bool {
    let Some(host) = self.website_host() else {
      return false;
    };
    match email.trim().rsplit_once('@') {
      Some((local, domain)) if !local.is_empty() => {
        domain.to_ascii_lowercase() == host
      }
      _ => false,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewListing {
  pub name:    String,
  pub website: Option<String>,
}

// ─── Businesses ──────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  EnumString,
  AsRefStr,
  Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlanTier {
  /// Assigned to every business created by the claim workflow.
  #[default]
  Free,
  Premium,
}

impl PlanTier {
  pub fn decode(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownPlan(s.to_owned()))
  }
}

/// The owning entity that one or more listings are attached to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
  pub business_id:   Uuid,
  pub owner_id:      Uuid,
  pub name:          String,
  pub contact_email: String,
  pub contact_phone: Option<String>,
  pub plan:          PlanTier,
  pub created_at:    DateTime<Utc>,
}
