//! Relation tuples, the atomic fact unit of the authorization backend.
//!
//! A tuple states that `subject` holds `relation` on `object` within
//! `namespace`. Tuples are never updated in place; a relationship is created,
//! changed or removed only by inserting or deleting whole tuples.

use std::fmt;

use serde::{Deserialize, Serialize};

// ─── Well-known names ────────────────────────────────────────────────────────

/// Namespaces used by the relationship mapper.
pub mod namespace {
  pub const USER: &str = "User";
  pub const PHOTO: &str = "Photo";
}

/// Relations that are not photo-event association kinds.
pub mod relation {
  pub const FRIEND: &str = "friend";
  pub const VIEW: &str = "view";
}

// ─── Subject ─────────────────────────────────────────────────────────────────

/// The subject side of a tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectRef {
  /// A concrete subject identified by an opaque string.
  Id(String),
  /// Everyone holding `relation` on `namespace:object`. Never written by the
  /// mapper; tolerated when read back.
  Set {
    namespace: String,
    object:    String,
    relation:  String,
  },
}

impl SubjectRef {
  pub fn id(id: impl Into<String>) -> Self { Self::Id(id.into()) }

  pub fn as_id(&self) -> Option<&str> {
    match self {
      Self::Id(id) => Some(id),
      Self::Set { .. } => None,
    }
  }
}

impl fmt::Display for SubjectRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Id(id) => f.write_str(id),
      Self::Set { namespace, object, relation } => {
        write!(f, "{namespace}:{object}#{relation}")
      }
    }
  }
}

// ─── Tuple ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tuple {
  pub namespace: String,
  pub object:    String,
  pub relation:  String,
  pub subject:   SubjectRef,
}

impl Tuple {
  /// A tuple whose subject is a concrete ID.
  pub fn new(
    namespace: impl Into<String>,
    object: impl Into<String>,
    relation: impl Into<String>,
    subject_id: impl Into<String>,
  ) -> Self {
    Self {
      namespace: namespace.into(),
      object:    object.into(),
      relation:  relation.into(),
      subject:   SubjectRef::id(subject_id),
    }
  }
}

impl fmt::Display for Tuple {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}:{}#{}@{}",
      self.namespace, self.object, self.relation, self.subject
    )
  }
}

// ─── Deltas ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaAction {
  Insert,
  Delete,
}

/// One entry of an atomic transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TupleDelta {
  pub action: DeltaAction,
  pub tuple:  Tuple,
}

impl TupleDelta {
  pub fn new(action: DeltaAction, tuple: Tuple) -> Self {
    Self { action, tuple }
  }

  pub fn insert(tuple: Tuple) -> Self { Self::new(DeltaAction::Insert, tuple) }

  pub fn delete(tuple: Tuple) -> Self { Self::new(DeltaAction::Delete, tuple) }
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::TupleStore::list_tuples`]. Every `None`
/// field is a wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TupleQuery {
  pub namespace: Option<String>,
  pub object:    Option<String>,
  pub relation:  Option<String>,
  pub subject:   Option<SubjectRef>,
}

impl TupleQuery {
  /// Whether `tuple` satisfies every set field of this query.
  pub fn matches(&self, tuple: &Tuple) -> bool {
    fn field(want: &Option<String>, have: &str) -> bool {
      want.as_deref().is_none_or(|w| w == have)
    }

    field(&self.namespace, &tuple.namespace)
      && field(&self.object, &tuple.object)
      && field(&self.relation, &tuple.relation)
      && self.subject.as_ref().is_none_or(|s| *s == tuple.subject)
  }
}
