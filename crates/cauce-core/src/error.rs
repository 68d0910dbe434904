//! Error types for `cauce-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("not a recognized workflow state: {0:?}")]
  InvalidState(String),

  #[error("unknown grouping key: {0:?}")]
  UnknownGroupKey(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
