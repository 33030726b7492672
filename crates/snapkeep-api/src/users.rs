//! Handlers for `/users` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/users/friends` | Body: `{"user1_id":"..","user2_id":".."}` |
//! | `POST`   | `/users/friends/batch` | Body: `{"relationships":[...]}` |
//! | `DELETE` | `/users/:user1_id/friends/:user2_id` | Removes both directions |

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use snapkeep_core::{
  RelationshipMapper, relation::FriendRelationship, store::TupleStore,
};

use crate::{
  error::ApiError,
  extract::{Body, Segments},
};

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /users/friends`
pub async fn create_friend<S>(
  State(mapper): State<Arc<RelationshipMapper<S>>>,
  Body(rel): Body<FriendRelationship>,
) -> Result<Json<Value>, ApiError>
where
  S: TupleStore,
{
  mapper.create_friend_relation(&rel.user1_id, &rel.user2_id).await?;
  Ok(Json(json!({ "message": "friend relation created" })))
}

// ─── Batch create ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BatchFriendBody {
  pub relationships: Vec<FriendRelationship>,
}

/// `POST /users/friends/batch`
///
/// All friendships are written or none are.
pub async fn batch_create_friends<S>(
  State(mapper): State<Arc<RelationshipMapper<S>>>,
  Body(body): Body<BatchFriendBody>,
) -> Result<Json<Value>, ApiError>
where
  S: TupleStore,
{
  mapper.batch_create_friend_relations(&body.relationships).await?;
  Ok(Json(json!({
    "message": "friend relations created",
    "count":   body.relationships.len(),
  })))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /users/:user1_id/friends/:user2_id`
pub async fn delete_friend<S>(
  State(mapper): State<Arc<RelationshipMapper<S>>>,
  Segments((user1_id, user2_id)): Segments<(String, String)>,
) -> Result<Json<Value>, ApiError>
where
  S: TupleStore,
{
  mapper.delete_friend_relation(&user1_id, &user2_id).await?;
  Ok(Json(json!({ "message": "friend relation deleted" })))
}
