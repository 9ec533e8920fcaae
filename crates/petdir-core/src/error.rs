//! Error types for `petdir-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown claim status: {0:?}")]
  UnknownStatus(String),

  #[error("unknown verification method: {0:?}")]
  UnknownMethod(String),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("unknown plan tier: {0:?}")]
  UnknownPlan(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
