//! [`RelationshipMapper`] translates domain relationships into relation
//! tuples and tuple query results back into domain shapes.
//!
//! Encoding rules:
//!
//! | Relationship | Tuples |
//! |--------------|--------|
//! | friendship(u1, u2) | `User:u1#friend@u2` and `User:u2#friend@u1` |
//! | view permission(p, u) | `Photo:p#view@u` |
//! | association(p, e, kind) | `Photo:p#<kind>@e` |
//!
//! Every write, single or batched, is exactly one [`TupleStore::transact`]
//! call, so a rejected write leaves no partial state behind. Identifiers are
//! checked for emptiness before anything is sent.

use tracing::debug;

use crate::{
  Error, Result,
  relation::{
    AssociationKind, FriendRelationship, PhotoEventRelation, PhotoEvents,
    PhotoPermission,
  },
  store::TupleStore,
  tuple::{
    DeltaAction, SubjectRef, Tuple, TupleDelta, TupleQuery, namespace,
    relation,
  },
};

// ─── Tuple encoding ──────────────────────────────────────────────────────────

fn require(field: &str, value: &str) -> Result<()> {
  if value.is_empty() {
    return Err(Error::InvalidArgument(format!("{field} must not be empty")));
  }
  Ok(())
}

/// Both directions of a friendship.
fn friend_deltas(
  action: DeltaAction,
  user1_id: &str,
  user2_id: &str,
) -> Result<[TupleDelta; 2]> {
  require("user1_id", user1_id)?;
  require("user2_id", user2_id)?;
  Ok([
    TupleDelta::new(
      action,
      Tuple::new(namespace::USER, user1_id, relation::FRIEND, user2_id),
    ),
    TupleDelta::new(
      action,
      Tuple::new(namespace::USER, user2_id, relation::FRIEND, user1_id),
    ),
  ])
}

fn view_tuple(photo_id: &str, user_id: &str) -> Result<Tuple> {
  require("photo_id", photo_id)?;
  require("user_id", user_id)?;
  Ok(Tuple::new(namespace::PHOTO, photo_id, relation::VIEW, user_id))
}

fn association_tuple(
  photo_id: &str,
  event_id: &str,
  kind: AssociationKind,
) -> Result<Tuple> {
  require("photo_id", photo_id)?;
  require("event_id", event_id)?;
  Ok(Tuple::new(namespace::PHOTO, photo_id, kind.as_str(), event_id))
}

// ─── Mapper ──────────────────────────────────────────────────────────────────

/// Domain operations over an injected [`TupleStore`].
///
/// Holds no state besides the store; share it behind an `Arc`.
pub struct RelationshipMapper<S> {
  store: S,
}

impl<S: TupleStore> RelationshipMapper<S> {
  pub fn new(store: S) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }

  /// Release the store's connections. Safe to call more than once.
  pub fn close(&self) { self.store.close() }

  async fn submit(&self, deltas: Vec<TupleDelta>) -> Result<()> {
    if deltas.is_empty() {
      debug!("empty transaction, nothing to submit");
      return Ok(());
    }
    debug!(deltas = deltas.len(), "submitting transaction");
    self.store.transact(deltas).await.map_err(Error::backend)
  }

  // ── Friendship ────────────────────────────────────────────────────────

  pub async fn create_friend_relation(
    &self,
    user1_id: &str,
    user2_id: &str,
  ) -> Result<()> {
    let deltas = friend_deltas(DeltaAction::Insert, user1_id, user2_id)?;
    self.submit(deltas.into()).await
  }

  /// Two inserts per friendship, all in one transaction.
  pub async fn batch_create_friend_relations(
    &self,
    relations: &[FriendRelationship],
  ) -> Result<()> {
    let mut deltas = Vec::with_capacity(relations.len() * 2);
    for rel in relations {
      deltas.extend(friend_deltas(
        DeltaAction::Insert,
        &rel.user1_id,
        &rel.user2_id,
      )?);
    }
    self.submit(deltas).await
  }

  /// Removes both directions of a friendship atomically.
  pub async fn delete_friend_relation(
    &self,
    user1_id: &str,
    user2_id: &str,
  ) -> Result<()> {
    let deltas = friend_deltas(DeltaAction::Delete, user1_id, user2_id)?;
    self.submit(deltas.into()).await
  }

  // ── View permissions ──────────────────────────────────────────────────

  pub async fn create_photo_view_permission(
    &self,
    photo_id: &str,
    user_id: &str,
  ) -> Result<()> {
    let tuple = view_tuple(photo_id, user_id)?;
    self.submit(vec![TupleDelta::insert(tuple)]).await
  }

  pub async fn batch_create_photo_view_permissions(
    &self,
    permissions: &[PhotoPermission],
  ) -> Result<()> {
    let deltas = permissions
      .iter()
      .map(|p| view_tuple(&p.photo_id, &p.user_id).map(TupleDelta::insert))
      .collect::<Result<Vec<_>>>()?;
    self.submit(deltas).await
  }

  // ── Photo-event associations ──────────────────────────────────────────

  pub async fn create_photo_event_association(
    &self,
    photo_id: &str,
    event_id: &str,
    kind: AssociationKind,
  ) -> Result<()> {
    let tuple = association_tuple(photo_id, event_id, kind)?;
    self.submit(vec![TupleDelta::insert(tuple)]).await
  }

  /// One insert per relation, in input order, duplicates kept.
  pub async fn batch_create_photo_event_associations(
    &self,
    relations: &[PhotoEventRelation],
    kind: AssociationKind,
  ) -> Result<()> {
    let deltas = relations
      .iter()
      .map(|r| {
        association_tuple(&r.photo_id, &r.event_id, kind).map(TupleDelta::insert)
      })
      .collect::<Result<Vec<_>>>()?;
    self.submit(deltas).await
  }

  /// `kind` arrives as a raw string and must name a known association kind;
  /// anything else is rejected without a backend call.
  pub async fn delete_association(
    &self,
    photo_id: &str,
    event_id: &str,
    kind: &str,
  ) -> Result<()> {
    let kind: AssociationKind = kind.parse()?;
    let tuple = association_tuple(photo_id, event_id, kind)?;
    self.submit(vec![TupleDelta::delete(tuple)]).await
  }

  /// Photo IDs attached to `event_id` with `kind`, in backend order.
  pub async fn get_associated_photos(
    &self,
    event_id: &str,
    kind: AssociationKind,
  ) -> Result<Vec<String>> {
    require("event_id", event_id)?;
    let query = TupleQuery {
      namespace: Some(namespace::PHOTO.to_owned()),
      relation: Some(kind.as_str().to_owned()),
      subject: Some(SubjectRef::id(event_id)),
      ..Default::default()
    };
    let tuples = self
      .store
      .list_tuples(&query)
      .await
      .map_err(Error::backend)?;
    Ok(tuples.into_iter().map(|t| t.object).collect())
  }

  /// Events attached to `photo_id`, grouped by kind. Tuples with any other
  /// relation, or with a subject set instead of an ID, are skipped.
  pub async fn get_associated_events(
    &self,
    photo_id: &str,
  ) -> Result<PhotoEvents> {
    require("photo_id", photo_id)?;
    let query = TupleQuery {
      namespace: Some(namespace::PHOTO.to_owned()),
      object: Some(photo_id.to_owned()),
      ..Default::default()
    };
    let tuples = self
      .store
      .list_tuples(&query)
      .await
      .map_err(Error::backend)?;

    Ok(tuples.into_iter().fold(PhotoEvents::default(), |mut events, t| {
      match (t.relation.parse::<AssociationKind>(), t.subject) {
        (Ok(kind), SubjectRef::Id(event_id)) => {
          events.get_mut(kind).push(event_id)
        }
        _ => debug!(relation = %t.relation, "skipping non-association tuple"),
      }
      events
    }))
  }

  // ── Checks ────────────────────────────────────────────────────────────

  /// Whether `namespace:object#relation@subject` currently holds.
  pub async fn check_permission(
    &self,
    namespace: &str,
    object: &str,
    relation: &str,
    subject: &str,
  ) -> Result<bool> {
    require("namespace", namespace)?;
    require("object", object)?;
    require("relation", relation)?;
    require("subject", subject)?;
    let tuple = Tuple::new(namespace, object, relation, subject);
    self.store.check(&tuple).await.map_err(Error::backend)
  }
}
