//! Server configuration, loaded from `config.toml` and `SNAPKEEP_*` variables.

use std::{path::PathBuf, time::Duration};

use anyhow::Context as _;
use serde::Deserialize;
use snapkeep_keto::KetoConfig;

/// Which [`TupleStore`](snapkeep_core::store::TupleStore) the server runs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
  #[default]
  Keto,
  /// Process-local tuples, lost on exit.
  Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                 String,
  pub port:                 u16,
  pub backend:              Backend,
  pub keto_write_url:       String,
  pub keto_read_url:        String,
  pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    let keto = KetoConfig::default();
    Self {
      host:                 "127.0.0.1".to_string(),
      port:                 8080,
      backend:              Backend::default(),
      keto_write_url:       keto.write_url,
      keto_read_url:        keto.read_url,
      request_timeout_secs: keto.timeout.as_secs(),
    }
  }
}

impl ServerConfig {
  /// Layer the optional file at `path` under the environment.
  pub fn load(path: PathBuf) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("SNAPKEEP"))
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn keto(&self) -> KetoConfig {
    KetoConfig {
      write_url: self.keto_write_url.clone(),
      read_url:  self.keto_read_url.clone(),
      timeout:   Duration::from_secs(self.request_timeout_secs),
    }
  }
}
