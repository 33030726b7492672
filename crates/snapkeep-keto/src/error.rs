//! Error type for `snapkeep-keto`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid {endpoint} endpoint url {url:?}: {reason}")]
  InvalidUrl {
    endpoint: &'static str,
    url:      String,
    reason:   String,
  },

  /// Raised only while connecting; the connector is never handed out.
  #[error("failed to connect to keto {endpoint} endpoint at {url}: {reason}")]
  ConnectionFailed {
    endpoint: &'static str,
    url:      String,
    reason:   String,
  },

  #[error("keto request failed: {0}")]
  Transport(#[from] reqwest::Error),

  /// Keto answered with a non-success status.
  #[error("keto rejected request ({status}): {message}")]
  Rejected { status: u16, message: String },

  #[error("malformed keto response: {0}")]
  Malformed(String),

  #[error("keto connector is closed")]
  Closed,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
