//! Handler for `GET /events/:event_id/photos/:kind`.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;
use snapkeep_core::{
  RelationshipMapper, relation::AssociationKind, store::TupleStore,
};

use crate::{error::ApiError, extract::Segments};

#[derive(Debug, Serialize)]
pub struct EventPhotos {
  pub event_id: String,
  pub kind:     AssociationKind,
  /// In the order the backend returned them.
  pub photos:   Vec<String>,
}

/// `GET /events/:event_id/photos/:kind`
///
/// Responds 400 for an unknown kind.
pub async fn photos<S>(
  State(mapper): State<Arc<RelationshipMapper<S>>>,
  Segments((event_id, kind)): Segments<(String, String)>,
) -> Result<Json<EventPhotos>, ApiError>
where
  S: TupleStore,
{
  let kind: AssociationKind = kind.parse()?;
  let photos = mapper.get_associated_photos(&event_id, kind).await?;
  Ok(Json(EventPhotos { event_id, kind, photos }))
}
