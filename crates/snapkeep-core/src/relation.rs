//! Domain relationships between users, photos and events.
//!
//! These are the shapes callers hand to the mapper. How each one is encoded
//! as tuples is decided in [`crate::mapper`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

// ─── Association kind ────────────────────────────────────────────────────────

/// The two named ways a photo can be attached to an event. A photo may hold
/// both kinds towards the same event at once.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AssociationKind {
  Reference,
  Polaroid,
}

impl AssociationKind {
  pub const ALL: [Self; 2] = [Self::Reference, Self::Polaroid];

  /// The relation string stored in the `Photo` namespace.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Reference => "reference",
      Self::Polaroid => "polaroid",
    }
  }
}

impl fmt::Display for AssociationKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for AssociationKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "reference" => Ok(Self::Reference),
      "polaroid" => Ok(Self::Polaroid),
      other => Err(Error::InvalidArgument(format!(
        "unknown relation kind {other:?}, expected \"reference\" or \"polaroid\""
      ))),
    }
  }
}

// ─── Relationship inputs ─────────────────────────────────────────────────────

/// A friendship between two users. Always stored in both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRelationship {
  pub user1_id: String,
  pub user2_id: String,
}

/// Grants `user_id` the right to view `photo_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoPermission {
  pub photo_id: String,
  pub user_id:  String,
}

/// A photo attached to an event; the kind is supplied separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoEventRelation {
  pub photo_id: String,
  pub event_id: String,
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// Events attached to one photo, grouped by association kind. Both groups are
/// always present, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoEvents {
  pub reference: Vec<String>,
  pub polaroid:  Vec<String>,
}

impl PhotoEvents {
  pub fn get(&self, kind: AssociationKind) -> &[String] {
    match kind {
      AssociationKind::Reference => &self.reference,
      AssociationKind::Polaroid => &self.polaroid,
    }
  }

  pub fn get_mut(&mut self, kind: AssociationKind) -> &mut Vec<String> {
    match kind {
      AssociationKind::Reference => &mut self.reference,
      AssociationKind::Polaroid => &mut self.polaroid,
    }
  }
}
