//! JSON REST API for snapkeep.
//!
//! Exposes an axum [`Router`] over a [`RelationshipMapper`]. Handlers only
//! decode requests and encode results; every relationship rule lives in the
//! mapper. Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", snapkeep_api::api_router(mapper.clone()))
//! ```

pub mod error;
pub mod events;
pub mod extract;
pub mod photos;
pub mod users;

use std::sync::Arc;

use axum::{
  Extension, Router,
  routing::{delete, get, post},
};
use snapkeep_core::{
  RelationshipMapper, relation::AssociationKind, store::TupleStore,
};

pub use error::ApiError;

/// Build a fully-materialised API router for `mapper`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(mapper: Arc<RelationshipMapper<S>>) -> Router<()>
where
  S: TupleStore + 'static,
{
  let mut router = Router::new()
    // Friendships
    .route("/users/friends", post(users::create_friend::<S>))
    .route("/users/friends/batch", post(users::batch_create_friends::<S>))
    .route(
      "/users/{user1_id}/friends/{user2_id}",
      delete(users::delete_friend::<S>),
    )
    // View permissions and checks
    .route("/photos/permissions", post(photos::create_permission::<S>))
    .route(
      "/photos/permissions/batch",
      post(photos::batch_create_permissions::<S>),
    )
    .route("/photos/check", get(photos::check::<S>))
    // Photo-event associations
    .route("/photos/{photo_id}/events", get(photos::events::<S>))
    .route(
      "/photos/{photo_id}/events/{event_id}/{kind}",
      delete(photos::delete_association::<S>),
    )
    .route("/events/{event_id}/photos/{kind}", get(events::photos::<S>));

  // One static route per kind: `/photos/reference`, `/photos/polaroid`, ...
  for kind in AssociationKind::ALL {
    let base = format!("/photos/{}", kind.as_str());
    router = router
      .route(
        &base,
        post(photos::create_association::<S>).layer(Extension(kind)),
      )
      .route(
        &format!("{base}/batch"),
        post(photos::batch_create_associations::<S>).layer(Extension(kind)),
      );
  }

  router.with_state(mapper)
}

// ─── Integration tests ────────────────────────────────────────────────────────
