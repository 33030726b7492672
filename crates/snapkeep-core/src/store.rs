//! The `TupleStore` trait: the capability boundary to the authorization
//! backend.
//!
//! Implemented by backend connectors (e.g. `snapkeep-keto`) and by
//! [`crate::memory::MemoryTupleStore`]. The mapper depends on this trait only.

use std::future::Future;

use crate::tuple::{Tuple, TupleDelta, TupleQuery};

/// Primitive operations offered by a relation-tuple backend.
///
/// Implementations hold no per-call mutable state and are shared across tasks;
/// every method returns a `Send` future so the trait works under a
/// multi-threaded tokio runtime behind axum.
pub trait TupleStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Apply all `deltas` atomically: either every insert and delete takes
  /// effect or none does. Inserting an existing tuple and deleting a missing
  /// one are not errors.
  fn transact(
    &self,
    deltas: Vec<TupleDelta>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Return every tuple matching `query`, in backend order.
  fn list_tuples<'a>(
    &'a self,
    query: &'a TupleQuery,
  ) -> impl Future<Output = Result<Vec<Tuple>, Self::Error>> + Send + 'a;

  /// Whether `tuple` holds in the backend's current view.
  fn check<'a>(
    &'a self,
    tuple: &'a Tuple,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Release backend connections. Idempotent; calls made afterwards fail.
  fn close(&self);
}
