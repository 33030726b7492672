//! Error types for `snapkeep-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Rejected locally before any backend call was made.
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  /// A transact, list or check call failed. The backend error is kept as the
  /// source and its message is forwarded unchanged.
  #[error("backend call failed: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn backend<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Backend(Box::new(err))
  }

  pub fn is_invalid_argument(&self) -> bool {
    matches!(self, Self::InvalidArgument(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
