//! Runtime configuration, read from `config.toml` and `PETDIR_*` variables.

use std::path::PathBuf;

use anyhow::{Context as _, ensure};
use argon2::PasswordHash;
use chrono::TimeDelta;
use petdir_core::{messages::Locale, workflow::ClaimSettings};
use serde::Deserialize;

/// Server configuration. Every field except the admin password hash has a
/// default.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  #[serde(default = "default_store_path")]
  pub store_path:          PathBuf,
  #[serde(default = "default_admin_username")]
  pub admin_username:      String,
  /// PHC string; generate one with `petdir --hash-password`.
  pub admin_password_hash: String,
  #[serde(default)]
  pub default_locale:      Locale,
  #[serde(default = "default_code_ttl_minutes")]
  pub code_ttl_minutes:    i64,
  #[serde(default = "default_dashboard_path")]
  pub dashboard_path:      String,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/petdir/petdir.db") }
fn default_admin_username() -> String { "admin".to_string() }
fn default_code_ttl_minutes() -> i64 { 60 }
fn default_dashboard_path() -> String { "/dashboard".to_string() }

/// One week.
const MAX_CODE_TTL_MINUTES: i64 = 7 * 24 * 60;

impl ServerConfig {
  /// Reject values that would only fail later, at request time.
  pub fn validate(&self) -> anyhow::Result<()> {
    self.code_ttl()?;
    PasswordHash::new(&self.admin_password_hash)
      .map_err(|e| anyhow::anyhow!("{e}"))
      .context("admin_password_hash is not an argon2 PHC string")?;
    Ok(())
  }

  fn code_ttl(&self) -> anyhow::Result<TimeDelta> {
    ensure!(
      (1..=MAX_CODE_TTL_MINUTES).contains(&self.code_ttl_minutes),
      "code_ttl_minutes must be between 1 and {MAX_CODE_TTL_MINUTES}, got {}",
      self.code_ttl_minutes
    );
    TimeDelta::try_minutes(self.code_ttl_minutes)
      .context("code_ttl_minutes does not fit in a duration")
  }

  pub fn claim_settings(&self) -> anyhow::Result<ClaimSettings> {
    Ok(ClaimSettings {
      code_ttl:       self.code_ttl()?,
      dashboard_path: self.dashboard_path.clone(),
    })
  }
}
