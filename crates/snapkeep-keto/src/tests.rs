//! Integration tests for `KetoConnector` against a throwaway HTTP server that
//! speaks the Keto REST protocol and keeps its tuples in a
//! [`MemoryTupleStore`].

use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
  Json, Router,
  extract::{Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  routing::get,
};
use serde_json::json;
use snapkeep_core::{
  RelationshipMapper,
  memory::MemoryTupleStore,
  relation::AssociationKind,
  store::TupleStore,
  tuple::{DeltaAction, SubjectRef, Tuple, TupleDelta, TupleQuery},
};
use tokio::{
  io::{AsyncReadExt, AsyncWriteExt},
  net::TcpListener,
};

use crate::{
  Error, KetoConfig, KetoConnector,
  encode::{CheckResponse, ListResponse, WirePatch, WireTuple},
};

// ─── Fake Keto ───────────────────────────────────────────────────────────────

const PAGE_SIZE: usize = 2;

type Fake = Arc<MemoryTupleStore>;

fn server_error(message: String) -> Response {
  (
    StatusCode::INTERNAL_SERVER_ERROR,
    Json(json!({ "error": { "code": 500, "message": message } })),
  )
    .into_response()
}

fn subject_from(params: &HashMap<String, String>) -> Option<SubjectRef> {
  if let Some(id) = params.get("subject_id") {
    return Some(SubjectRef::Id(id.clone()));
  }
  Some(SubjectRef::Set {
    namespace: params.get("subject_set.namespace")?.clone(),
    object:    params.get("subject_set.object")?.clone(),
    relation:  params.get("subject_set.relation")?.clone(),
  })
}

async fn alive() -> Json<serde_json::Value> { Json(json!({ "status": "ok" })) }

async fn patch_tuples(
  State(store): State<Fake>,
  Json(body): Json<Vec<WirePatch>>,
) -> Response {
  let mut deltas = Vec::with_capacity(body.len());
  for patch in body {
    match Tuple::try_from(patch.relation_tuple) {
      Ok(tuple) => deltas.push(TupleDelta { action: patch.action, tuple }),
      Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
  }
  match store.transact(deltas).await {
    Ok(()) => StatusCode::NO_CONTENT.into_response(),
    Err(e) => server_error(e.to_string()),
  }
}

async fn list_tuples(
  State(store): State<Fake>,
  Query(params): Query<HashMap<String, String>>,
) -> Response {
  let query = TupleQuery {
    namespace: params.get("namespace").cloned(),
    object:    params.get("object").cloned(),
    relation:  params.get("relation").cloned(),
    subject:   subject_from(&params),
  };
  let all = match store.list_tuples(&query).await {
    Ok(all) => all,
    Err(e) => return server_error(e.to_string()),
  };

  let start: usize = params
    .get("page_token")
    .and_then(|t| t.parse().ok())
    .unwrap_or(0);
  let end = (start + PAGE_SIZE).min(all.len());
  let next_page_token = if end < all.len() {
    end.to_string()
  } else {
    String::new()
  };
  Json(ListResponse {
    relation_tuples: all[start..end].iter().map(WireTuple::from).collect(),
    next_page_token,
  })
  .into_response()
}

async fn check(
  State(store): State<Fake>,
  Query(params): Query<HashMap<String, String>>,
) -> Response {
  let (Some(namespace), Some(object), Some(relation), Some(subject)) = (
    params.get("namespace"),
    params.get("object"),
    params.get("relation"),
    subject_from(&params),
  ) else {
    return (StatusCode::BAD_REQUEST, "incomplete tuple").into_response();
  };
  let tuple = Tuple {
    namespace: namespace.clone(),
    object: object.clone(),
    relation: relation.clone(),
    subject,
  };
  match store.check(&tuple).await {
    Ok(allowed) => Json(CheckResponse { allowed }).into_response(),
    Err(e) => server_error(e.to_string()),
  }
}

async fn serve(router: Router) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, router).await.unwrap();
  });
  format!("http://{addr}")
}

/// A fake Keto with separate read and write listeners over one tuple store.
async fn fake_keto(store: Fake) -> KetoConfig {
  let write = Router::new()
    .route("/health/alive", get(alive))
    .route("/admin/relation-tuples", axum::routing::patch(patch_tuples))
    .with_state(store.clone());
  let read = Router::new()
    .route("/health/alive", get(alive))
    .route("/relation-tuples", get(list_tuples))
    .route("/relation-tuples/check/openapi", get(check))
    .with_state(store);

  KetoConfig {
    write_url: serve(write).await,
    read_url:  serve(read).await,
    timeout:   Duration::from_secs(5),
  }
}

async fn connected() -> (Fake, KetoConnector) {
  let store = Arc::new(MemoryTupleStore::new().recording());
  let config = fake_keto(store.clone()).await;
  let connector = KetoConnector::connect(&config).await.expect("connect");
  (store, connector)
}

/// Answers health checks, then cuts every other response off mid-body.
async fn truncating_server() -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    while let Ok((mut socket, _)) = listener.accept().await {
      tokio::spawn(async move {
        let mut buf = [0u8; 1024];
        let mut head = Vec::new();
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
          match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => head.extend_from_slice(&buf[..n]),
          }
        }
        let reply: &[u8] = if head.starts_with(b"GET /health/alive") {
          b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
        } else {
          b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 64\r\nconnection: close\r\n\r\n{\"error\":"
        };
        let _ = socket.write_all(reply).await;
        let _ = socket.shutdown().await;
      });
    }
  });
  format!("http://{addr}")
}

async fn dead_url() -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);
  format!("http://{addr}")
}

// ─── Construction ────────────────────────────────────────────────────────────

#[tokio::test]
async fn connect_fails_fast_when_write_endpoint_is_down() {
  let store = Arc::new(MemoryTupleStore::new());
  let mut config = fake_keto(store).await;
  config.write_url = dead_url().await;

  let err = KetoConnector::connect(&config).await.unwrap_err();
  assert!(
    matches!(err, Error::ConnectionFailed { endpoint: "write", .. }),
    "{err}"
  );
}

#[tokio::test]
async fn connect_fails_fast_when_read_endpoint_is_down() {
  let store = Arc::new(MemoryTupleStore::new());
  let mut config = fake_keto(store).await;
  config.read_url = dead_url().await;

  let err = KetoConnector::connect(&config).await.unwrap_err();
  assert!(
    matches!(err, Error::ConnectionFailed { endpoint: "read", .. }),
    "{err}"
  );
}

#[tokio::test]
async fn connect_rejects_unparseable_url() {
  let config = KetoConfig {
    write_url: "not a url".into(),
    ..KetoConfig::default()
  };
  let err = KetoConnector::connect(&config).await.unwrap_err();
  assert!(matches!(err, Error::InvalidUrl { endpoint: "write", .. }));
}

#[tokio::test]
async fn connect_treats_failing_health_check_as_unreachable() {
  let store = Arc::new(MemoryTupleStore::new());
  let mut config = fake_keto(store).await;
  let unhealthy = Router::new().route(
    "/health/alive",
    get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
  );
  config.read_url = serve(unhealthy).await;

  let err = KetoConnector::connect(&config).await.unwrap_err();
  assert!(err.to_string().contains("503"), "{err}");
}

// ─── Wire protocol ───────────────────────────────────────────────────────────

#[tokio::test]
async fn transact_sends_every_delta_in_one_request() {
  let (store, keto) = connected().await;
  keto
    .transact(vec![
      TupleDelta::insert(Tuple::new("User", "a", "friend", "b")),
      TupleDelta::insert(Tuple::new("User", "b", "friend", "a")),
    ])
    .await
    .unwrap();

  let txs = store.transactions();
  assert_eq!(txs.len(), 1);
  assert_eq!(txs[0].len(), 2);
  assert_eq!(store.tuples().len(), 2);
}

#[tokio::test]
async fn delete_deltas_keep_their_action() {
  let (store, keto) = connected().await;
  let t = Tuple::new("Photo", "p1", "view", "alice");
  keto.transact(vec![TupleDelta::insert(t.clone())]).await.unwrap();
  keto.transact(vec![TupleDelta::delete(t)]).await.unwrap();

  assert_eq!(store.transactions()[1][0].action, DeltaAction::Delete);
  assert!(store.tuples().is_empty());
}

#[tokio::test]
async fn list_follows_every_page_in_order() {
  let (store, keto) = connected().await;
  let seeded: Vec<_> = (1..=5)
    .map(|i| Tuple::new("Photo", format!("p{i}"), "reference", "e1"))
    .collect();
  store
    .transact(seeded.iter().cloned().map(TupleDelta::insert).collect())
    .await
    .unwrap();

  let query = TupleQuery {
    namespace: Some("Photo".into()),
    subject: Some(SubjectRef::id("e1")),
    ..Default::default()
  };
  let listed = keto.list_tuples(&query).await.unwrap();

  assert_eq!(listed, seeded);
  assert_eq!(store.list_calls(), 3);
}

#[tokio::test]
async fn subject_sets_survive_the_round_trip() {
  let (store, keto) = connected().await;
  let set = Tuple {
    namespace: "Photo".into(),
    object:    "p1".into(),
    relation:  "view".into(),
    subject:   SubjectRef::Set {
      namespace: "Group".into(),
      object:    "friends".into(),
      relation:  "member".into(),
    },
  };
  keto.transact(vec![TupleDelta::insert(set.clone())]).await.unwrap();

  assert_eq!(store.tuples(), vec![set.clone()]);
  assert!(keto.check(&set).await.unwrap());
}

#[tokio::test]
async fn check_answers_per_tuple() {
  let (store, keto) = connected().await;
  store
    .transact(vec![TupleDelta::insert(Tuple::new(
      "Photo", "photo1", "reference", "event1",
    ))])
    .await
    .unwrap();

  let yes = Tuple::new("Photo", "photo1", "reference", "event1");
  let no = Tuple::new("Photo", "photo1", "reference", "event2");
  assert!(keto.check(&yes).await.unwrap());
  assert!(!keto.check(&no).await.unwrap());
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn rejected_write_carries_keto_message() {
  let (store, keto) = connected().await;
  store.fail_writes(true);

  let err = keto
    .transact(vec![TupleDelta::insert(Tuple::new("Photo", "p1", "view", "a"))])
    .await
    .unwrap_err();

  match err {
    Error::Rejected { status, message } => {
      assert_eq!(status, 500);
      assert_eq!(message, "write path unavailable");
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[tokio::test]
async fn rejected_read_surfaces_as_error() {
  let (store, keto) = connected().await;
  store.fail_reads(true);
  let err = keto.list_tuples(&TupleQuery::default()).await.unwrap_err();
  assert!(matches!(err, Error::Rejected { status: 500, .. }));
}

#[tokio::test]
async fn close_is_idempotent_and_stops_calls_locally() {
  let (store, keto) = connected().await;
  keto.close();
  keto.close();
  assert!(keto.is_closed());

  let err = keto
    .check(&Tuple::new("Photo", "p1", "view", "a"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Closed));
  assert_eq!(store.check_calls(), 0);
}

#[tokio::test]
async fn close_releases_both_http_clients() {
  let (_store, keto) = connected().await;
  assert!(!keto.is_closed());
  assert!(format!("{keto:?}").contains("Some("));

  keto.close();

  assert!(keto.is_closed());
  assert!(!format!("{keto:?}").contains("Some("), "{keto:?}");
}

#[tokio::test]
async fn unreadable_error_body_is_a_transport_error() {
  let url = truncating_server().await;
  let keto = KetoConnector::connect(&KetoConfig {
    write_url: url.clone(),
    read_url:  url,
    timeout:   Duration::from_secs(5),
  })
  .await
  .unwrap();

  let err = keto.list_tuples(&TupleQuery::default()).await.unwrap_err();
  assert!(matches!(err, Error::Transport(_)), "{err}");
}

#[tokio::test]
async fn repeated_page_token_stops_pagination() {
  let store = Arc::new(MemoryTupleStore::new());
  let mut config = fake_keto(store.clone()).await;
  let looping = Router::new()
    .route("/health/alive", get(alive))
    .route(
      "/relation-tuples",
      get(|| async {
        Json(ListResponse {
          relation_tuples: vec![WireTuple::from(&Tuple::new(
            "Photo", "p1", "reference", "e1",
          ))],
          next_page_token: "again".into(),
        })
      }),
    );
  config.read_url = serve(looping).await;
  let keto = KetoConnector::connect(&config).await.unwrap();

  let err = keto.list_tuples(&TupleQuery::default()).await.unwrap_err();
  match err {
    Error::Malformed(message) => assert!(message.contains("again"), "{message}"),
    other => panic!("unexpected error: {other}"),
  }
}

// ─── Through the mapper ──────────────────────────────────────────────────────

#[tokio::test]
async fn mapper_groups_events_read_over_http() {
  let (_store, keto) = connected().await;
  let mapper = RelationshipMapper::new(keto);

  mapper
    .create_photo_event_association("p1", "e1", AssociationKind::Reference)
    .await
    .unwrap();
  mapper
    .create_photo_event_association("p1", "e2", AssociationKind::Polaroid)
    .await
    .unwrap();
  mapper.create_photo_view_permission("p1", "alice").await.unwrap();

  let events = mapper.get_associated_events("p1").await.unwrap();
  assert_eq!(events.reference, ["e1"]);
  assert_eq!(events.polaroid, ["e2"]);
}

#[tokio::test]
async fn mapper_batch_failure_over_http_leaves_no_tuples() {
  let (store, keto) = connected().await;
  let mapper = RelationshipMapper::new(keto);
  store.fail_writes(true);

  let err = mapper
    .batch_create_friend_relations(&[
      snapkeep_core::relation::FriendRelationship {
        user1_id: "a".into(),
        user2_id: "b".into(),
      },
      snapkeep_core::relation::FriendRelationship {
        user1_id: "c".into(),
        user2_id: "d".into(),
      },
    ])
    .await
    .unwrap_err();

  assert!(err.to_string().contains("write path unavailable"), "{err}");
  assert!(store.tuples().is_empty());
  assert_eq!(store.transactions()[0].len(), 4);
}
