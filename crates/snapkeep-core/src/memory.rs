//! [`MemoryTupleStore`]: an in-process [`TupleStore`].
//!
//! Keeps tuples in insertion order and applies each transaction to a copy
//! before swapping it in, so a transaction is all-or-nothing. Counts calls and
//! can be told to fail. A store built with [`MemoryTupleStore::recording`]
//! also keeps every transaction it receives; the default store does not, so
//! its memory tracks the tuple set only.

use std::sync::{
  RwLock,
  atomic::{AtomicBool, AtomicUsize, Ordering},
};

use thiserror::Error;

use crate::{
  store::TupleStore,
  tuple::{DeltaAction, Tuple, TupleDelta, TupleQuery},
};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("{0} unavailable")]
  Unavailable(&'static str),

  #[error("store is closed")]
  Closed,

  #[error("store lock poisoned")]
  Poisoned,
}

// ─── Store ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryTupleStore {
  tuples:         RwLock<Vec<Tuple>>,
  /// `None` unless built with [`MemoryTupleStore::recording`].
  transactions:   Option<RwLock<Vec<Vec<TupleDelta>>>>,
  transact_calls: AtomicUsize,
  list_calls:     AtomicUsize,
  check_calls:    AtomicUsize,
  fail_writes:    AtomicBool,
  fail_reads:     AtomicBool,
  closed:         AtomicBool,
}

impl MemoryTupleStore {
  pub fn new() -> Self { Self::default() }

  /// A store pre-seeded with `tuples`, without going through `transact`.
  pub fn with_tuples(tuples: impl IntoIterator<Item = Tuple>) -> Self {
    let store = Self::new();
    if let Ok(mut stored) = store.tuples.write() {
      for tuple in tuples {
        if !stored.contains(&tuple) {
          stored.push(tuple);
        }
      }
    }
    store
  }

  /// Keep a log of every transaction received, for inspection in tests.
  pub fn recording(mut self) -> Self {
    self.transactions.get_or_insert_with(RwLock::default);
    self
  }

  pub fn is_recording(&self) -> bool { self.transactions.is_some() }

  /// Make every following `transact` call fail (or succeed again).
  pub fn fail_writes(&self, fail: bool) {
    self.fail_writes.store(fail, Ordering::SeqCst);
  }

  /// Make every following `list_tuples` and `check` call fail.
  pub fn fail_reads(&self, fail: bool) {
    self.fail_reads.store(fail, Ordering::SeqCst);
  }

  /// Snapshot of the stored tuples, in insertion order.
  pub fn tuples(&self) -> Vec<Tuple> {
    self.tuples.read().map(|t| t.clone()).unwrap_or_default()
  }

  /// Every transaction received, including rejected ones. Empty unless the
  /// store is recording.
  pub fn transactions(&self) -> Vec<Vec<TupleDelta>> {
    self
      .transactions
      .as_ref()
      .and_then(|log| log.read().ok().map(|t| t.clone()))
      .unwrap_or_default()
  }

  pub fn transact_calls(&self) -> usize {
    self.transact_calls.load(Ordering::SeqCst)
  }

  pub fn list_calls(&self) -> usize { self.list_calls.load(Ordering::SeqCst) }

  pub fn check_calls(&self) -> usize { self.check_calls.load(Ordering::SeqCst) }

  /// Total number of backend calls of any kind.
  pub fn calls(&self) -> usize {
    self.transact_calls() + self.list_calls() + self.check_calls()
  }

  pub fn is_closed(&self) -> bool { self.closed.load(Ordering::SeqCst) }

  fn ensure_readable(&self) -> Result<(), MemoryError> {
    if self.is_closed() {
      return Err(MemoryError::Closed);
    }
    if self.fail_reads.load(Ordering::SeqCst) {
      return Err(MemoryError::Unavailable("read path"));
    }
    Ok(())
  }
}

fn apply(tuples: &mut Vec<Tuple>, delta: TupleDelta) {
  match delta.action {
    DeltaAction::Insert => {
      if !tuples.contains(&delta.tuple) {
        tuples.push(delta.tuple);
      }
    }
    DeltaAction::Delete => tuples.retain(|t| *t != delta.tuple),
  }
}

// ─── TupleStore impl ─────────────────────────────────────────────────────────

impl TupleStore for MemoryTupleStore {
  type Error = MemoryError;

  async fn transact(&self, deltas: Vec<TupleDelta>) -> Result<(), MemoryError> {
    self.transact_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(log) = &self.transactions {
      log
        .write()
        .map_err(|_| MemoryError::Poisoned)?
        .push(deltas.clone());
    }

    if self.is_closed() {
      return Err(MemoryError::Closed);
    }
    if self.fail_writes.load(Ordering::SeqCst) {
      return Err(MemoryError::Unavailable("write path"));
    }

    let mut stored = self.tuples.write().map_err(|_| MemoryError::Poisoned)?;
    let mut next = stored.clone();
    for delta in deltas {
      apply(&mut next, delta);
    }
    *stored = next;
    Ok(())
  }

  async fn list_tuples(
    &self,
    query: &TupleQuery,
  ) -> Result<Vec<Tuple>, MemoryError> {
    self.list_calls.fetch_add(1, Ordering::SeqCst);
    self.ensure_readable()?;
    let stored = self.tuples.read().map_err(|_| MemoryError::Poisoned)?;
    Ok(stored.iter().filter(|t| query.matches(t)).cloned().collect())
  }

  async fn check(&self, tuple: &Tuple) -> Result<bool, MemoryError> {
    self.check_calls.fetch_add(1, Ordering::SeqCst);
    self.ensure_readable()?;
    let stored = self.tuples.read().map_err(|_| MemoryError::Poisoned)?;
    Ok(stored.contains(tuple))
  }

  fn close(&self) {
    if !self.closed.swap(true, Ordering::SeqCst) {
      tracing::debug!("memory tuple store closed");
    }
  }
}
