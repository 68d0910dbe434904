//! Error type for `cauce-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] cauce_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored column holds a value the domain no longer recognizes.
  #[error("cannot decode stored value: {0}")]
  Decode(String),

  #[error("claim not found: {0}")]
  ClaimNotFound(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
