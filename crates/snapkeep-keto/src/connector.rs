//! [`KetoConnector`]: the Keto REST implementation of [`TupleStore`].

use std::{
  collections::HashSet,
  sync::{PoisonError, RwLock},
  time::Duration,
};

use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use snapkeep_core::{
  store::TupleStore,
  tuple::{Tuple, TupleDelta, TupleQuery},
};
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  encode::{
    CheckResponse, ErrorBody, ListResponse, WirePatch, query_params,
    tuple_params,
  },
};

const HEALTH_PATH: &str = "/health/alive";
const TUPLES_PATH: &str = "/relation-tuples";
const CHECK_PATH: &str = "/relation-tuples/check/openapi";
const ADMIN_TUPLES_PATH: &str = "/admin/relation-tuples";

// ─── Configuration ───────────────────────────────────────────────────────────

/// Where Keto lives and how long a single request may take.
#[derive(Debug, Clone)]
pub struct KetoConfig {
  /// Base URL of the write API, e.g. `http://127.0.0.1:4467`.
  pub write_url: String,
  /// Base URL of the read API, e.g. `http://127.0.0.1:4466`.
  pub read_url:  String,
  pub timeout:   Duration,
}

impl Default for KetoConfig {
  fn default() -> Self {
    Self {
      write_url: "http://127.0.0.1:4467".to_string(),
      read_url:  "http://127.0.0.1:4466".to_string(),
      timeout:   Duration::from_secs(10),
    }
  }
}

// ─── Endpoint ────────────────────────────────────────────────────────────────

/// One Keto endpoint with its own HTTP client and connection pool. The client
/// is taken out on close, which drops the pool and its idle connections.
#[derive(Debug)]
struct Endpoint {
  name:     &'static str,
  base_url: String,
  client:   RwLock<Option<Client>>,
}

impl Endpoint {
  /// Build the client and probe the liveness endpoint; any failure aborts.
  async fn dial(
    name: &'static str,
    url: &str,
    timeout: Duration,
  ) -> Result<Self> {
    Url::parse(url).map_err(|e| Error::InvalidUrl {
      endpoint: name,
      url:      url.to_string(),
      reason:   e.to_string(),
    })?;

    let failed = |reason: String| Error::ConnectionFailed {
      endpoint: name,
      url: url.to_string(),
      reason,
    };

    let client = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| failed(e.to_string()))?;
    let base_url = url.trim_end_matches('/').to_string();

    let resp = client
      .get(format!("{base_url}{HEALTH_PATH}"))
      .send()
      .await
      .map_err(|e| failed(e.to_string()))?;
    if !resp.status().is_success() {
      return Err(failed(format!("health check returned {}", resp.status())));
    }

    debug!(endpoint = name, url, "keto endpoint is alive");
    Ok(Self { name, base_url, client: RwLock::new(Some(client)) })
  }

  fn url(&self, path: &str) -> String { format!("{}{}", self.base_url, path) }

  /// A handle on the pooled client, or [`Error::Closed`] once released.
  fn client(&self) -> Result<Client> {
    self
      .client
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
      .ok_or(Error::Closed)
  }

  /// Drop the client. Returns whether this call released it.
  fn release(&self) -> bool {
    self
      .client
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .take()
      .is_some()
  }

  fn is_released(&self) -> bool {
    self
      .client
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .is_none()
  }
}

/// Pass successful responses through; turn anything else into
/// [`Error::Rejected`] carrying Keto's own message when it sent one.
async fn expect_success(resp: Response) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let text = resp.text().await?;
  let message = match serde_json::from_str::<ErrorBody>(&text) {
    Ok(body) => body.error.describe(),
    Err(_) if text.trim().is_empty() => {
      status.canonical_reason().unwrap_or("unknown error").to_string()
    }
    Err(_) => text,
  };
  warn!(status = status.as_u16(), %message, "keto rejected request");
  Err(Error::Rejected { status: status.as_u16(), message })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
  let bytes = resp.bytes().await?;
  serde_json::from_slice(&bytes).map_err(|e| Error::Malformed(e.to_string()))
}

// ─── Connector ───────────────────────────────────────────────────────────────

/// Two long-lived Keto connections: writes go to the write endpoint, list and
/// check calls to the read endpoint.
///
/// No retries, no backoff: a failed call is returned as is.
#[derive(Debug)]
pub struct KetoConnector {
  write: Endpoint,
  read:  Endpoint,
}

impl KetoConnector {
  /// Dial both endpoints eagerly. Fails if either one is unreachable, so a
  /// half-connected connector never exists.
  pub async fn connect(config: &KetoConfig) -> Result<Self> {
    let write = Endpoint::dial("write", &config.write_url, config.timeout).await?;
    let read = Endpoint::dial("read", &config.read_url, config.timeout).await?;
    info!(
      write = %write.base_url,
      read = %read.base_url,
      "connected to keto"
    );
    Ok(Self { write, read })
  }

  /// True once both endpoints have released their clients.
  pub fn is_closed(&self) -> bool {
    self.write.is_released() && self.read.is_released()
  }
}

impl TupleStore for KetoConnector {
  type Error = Error;

  async fn transact(&self, deltas: Vec<TupleDelta>) -> Result<()> {
    let client = self.write.client()?;
    let body: Vec<WirePatch> = deltas.iter().map(WirePatch::from).collect();
    debug!(
      endpoint = self.write.name,
      deltas = body.len(),
      "PATCH {ADMIN_TUPLES_PATH}"
    );
    let resp = client
      .patch(self.write.url(ADMIN_TUPLES_PATH))
      .json(&body)
      .send()
      .await?;
    expect_success(resp).await?;
    Ok(())
  }

  /// Follows `next_page_token` until Keto reports the last page. A token
  /// handed out twice is treated as a malformed response.
  async fn list_tuples(&self, query: &TupleQuery) -> Result<Vec<Tuple>> {
    let client = self.read.client()?;
    let params = query_params(query);
    let mut tuples = Vec::new();
    let mut seen_tokens = HashSet::new();
    let mut page_token: Option<String> = None;

    loop {
      let mut req = client.get(self.read.url(TUPLES_PATH)).query(&params);
      if let Some(token) = &page_token {
        req = req.query(&[("page_token", token)]);
      }
      let resp = expect_success(req.send().await?).await?;
      let page: ListResponse = decode(resp).await?;

      for wire in page.relation_tuples {
        tuples.push(Tuple::try_from(wire)?);
      }
      if page.next_page_token.is_empty() {
        break;
      }
      if !seen_tokens.insert(page.next_page_token.clone()) {
        return Err(Error::Malformed(format!(
          "page token {:?} repeated",
          page.next_page_token
        )));
      }
      page_token = Some(page.next_page_token);
    }

    debug!(
      endpoint = self.read.name,
      tuples = tuples.len(),
      "GET {TUPLES_PATH}"
    );
    Ok(tuples)
  }

  async fn check(&self, tuple: &Tuple) -> Result<bool> {
    let resp = self
      .read
      .client()?
      .get(self.read.url(CHECK_PATH))
      .query(&tuple_params(tuple))
      .send()
      .await?;
    let answer: CheckResponse = decode(expect_success(resp).await?).await?;
    debug!(%tuple, allowed = answer.allowed, "GET {CHECK_PATH}");
    Ok(answer.allowed)
  }

  /// Drops both clients and their pooled connections. In-flight calls keep
  /// their own handle and finish; later calls fail with [`Error::Closed`].
  fn close(&self) {
    let write = self.write.release();
    let read = self.read.release();
    if write || read {
      info!("keto connections closed");
    }
  }
}
