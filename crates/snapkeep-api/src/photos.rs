//! Handlers for `/photos` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/photos/permissions` | Body: `{"photo_id":"..","user_id":".."}` |
//! | `POST`   | `/photos/permissions/batch` | Body: `{"permissions":[...]}` |
//! | `GET`    | `/photos/check` | `?namespace&object&relation&subject`, all required |
//! | `POST`   | `/photos/reference`, `/photos/polaroid` | Body: `{"photo_id":"..","event_id":".."}` |
//! | `POST`   | `/photos/reference/batch`, `/photos/polaroid/batch` | Body: `{"relations":[...]}` |
//! | `GET`    | `/photos/:photo_id/events` | Events grouped by kind |
//! | `DELETE` | `/photos/:photo_id/events/:event_id/:kind` | 400 for an unknown kind |

use std::sync::Arc;

use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use snapkeep_core::{
  RelationshipMapper,
  relation::{
    AssociationKind, PhotoEventRelation, PhotoEvents, PhotoPermission,
  },
  store::TupleStore,
};

use crate::{
  error::ApiError,
  extract::{Body, Params, Segments},
};

// ─── View permissions ─────────────────────────────────────────────────────────

/// `POST /photos/permissions`
pub async fn create_permission<S>(
  State(mapper): State<Arc<RelationshipMapper<S>>>,
  Body(perm): Body<PhotoPermission>,
) -> Result<Json<Value>, ApiError>
where
  S: TupleStore,
{
  mapper
    .create_photo_view_permission(&perm.photo_id, &perm.user_id)
    .await?;
  Ok(Json(json!({ "message": "photo permission created" })))
}

#[derive(Debug, Deserialize)]
pub struct BatchPermissionBody {
  pub permissions: Vec<PhotoPermission>,
}

/// `POST /photos/permissions/batch`
pub async fn batch_create_permissions<S>(
  State(mapper): State<Arc<RelationshipMapper<S>>>,
  Body(body): Body<BatchPermissionBody>,
) -> Result<Json<Value>, ApiError>
where
  S: TupleStore,
{
  mapper
    .batch_create_photo_view_permissions(&body.permissions)
    .await?;
  Ok(Json(json!({
    "message": "photo permissions created",
    "count":   body.permissions.len(),
  })))
}

// ─── Check ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckParams {
  pub namespace: String,
  pub object:    String,
  pub relation:  String,
  pub subject:   String,
}

#[derive(Debug, Serialize)]
pub struct CheckResult {
  pub allowed: bool,
  /// The tuple that was checked, echoed back.
  pub details: CheckParams,
}

/// `GET /photos/check?namespace=..&object=..&relation=..&subject=..`
pub async fn check<S>(
  State(mapper): State<Arc<RelationshipMapper<S>>>,
  Params(params): Params<CheckParams>,
) -> Result<Json<CheckResult>, ApiError>
where
  S: TupleStore,
{
  let allowed = mapper
    .check_permission(
      &params.namespace,
      &params.object,
      &params.relation,
      &params.subject,
    )
    .await?;
  Ok(Json(CheckResult { allowed, details: params }))
}

// ─── Associations ─────────────────────────────────────────────────────────────

/// `POST /photos/{kind}`
///
/// The kind is attached to the route as an [`Extension`] when the router is
/// built.
pub async fn create_association<S>(
  State(mapper): State<Arc<RelationshipMapper<S>>>,
  Extension(kind): Extension<AssociationKind>,
  Body(rel): Body<PhotoEventRelation>,
) -> Result<Json<Value>, ApiError>
where
  S: TupleStore,
{
  mapper
    .create_photo_event_association(&rel.photo_id, &rel.event_id, kind)
    .await?;
  Ok(Json(json!({ "message": format!("photo {kind} association created") })))
}

#[derive(Debug, Deserialize)]
pub struct BatchAssociationBody {
  pub relations: Vec<PhotoEventRelation>,
}

/// `POST /photos/{kind}/batch`
///
/// All associations are written or none are.
pub async fn batch_create_associations<S>(
  State(mapper): State<Arc<RelationshipMapper<S>>>,
  Extension(kind): Extension<AssociationKind>,
  Body(body): Body<BatchAssociationBody>,
) -> Result<Json<Value>, ApiError>
where
  S: TupleStore,
{
  mapper
    .batch_create_photo_event_associations(&body.relations, kind)
    .await?;
  Ok(Json(json!({
    "message": format!("photo {kind} associations created"),
    "count":   body.relations.len(),
  })))
}

#[derive(Debug, Serialize)]
pub struct PhotoEventsResult {
  pub photo_id: String,
  pub events:   PhotoEvents,
}

/// `GET /photos/:photo_id/events`
pub async fn events<S>(
  State(mapper): State<Arc<RelationshipMapper<S>>>,
  Segments(photo_id): Segments<String>,
) -> Result<Json<PhotoEventsResult>, ApiError>
where
  S: TupleStore,
{
  let events = mapper.get_associated_events(&photo_id).await?;
  Ok(Json(PhotoEventsResult { photo_id, events }))
}

/// `DELETE /photos/:photo_id/events/:event_id/:kind`
///
/// The kind stays a raw string here; the mapper rejects unknown kinds.
pub async fn delete_association<S>(
  State(mapper): State<Arc<RelationshipMapper<S>>>,
  Segments((photo_id, event_id, kind)): Segments<(String, String, String)>,
) -> Result<Json<Value>, ApiError>
where
  S: TupleStore,
{
  mapper.delete_association(&photo_id, &event_id, &kind).await?;
  Ok(Json(json!({ "message": "photo event association deleted" })))
}
