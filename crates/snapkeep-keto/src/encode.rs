//! Conversions between core tuple types and the Keto REST wire format.
//!
//! Keto flattens the subject into either a `subject_id` string or a
//! `subject_set` object on the tuple itself, and the same split shows up in
//! query strings as `subject_id=` or `subject_set.namespace=` and so on.

use serde::{Deserialize, Serialize};
use snapkeep_core::tuple::{
  DeltaAction, SubjectRef, Tuple, TupleDelta, TupleQuery,
};

use crate::{Error, Result};

// ─── Tuples ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSubjectSet {
  pub namespace: String,
  pub object:    String,
  pub relation:  String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTuple {
  pub namespace:   String,
  pub object:      String,
  pub relation:    String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subject_id:  Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subject_set: Option<WireSubjectSet>,
}

impl From<&Tuple> for WireTuple {
  fn from(t: &Tuple) -> Self {
    let (subject_id, subject_set) = match &t.subject {
      SubjectRef::Id(id) => (Some(id.clone()), None),
      SubjectRef::Set { namespace, object, relation } => (
        None,
        Some(WireSubjectSet {
          namespace: namespace.clone(),
          object:    object.clone(),
          relation:  relation.clone(),
        }),
      ),
    };
    Self {
      namespace: t.namespace.clone(),
      object: t.object.clone(),
      relation: t.relation.clone(),
      subject_id,
      subject_set,
    }
  }
}

impl TryFrom<WireTuple> for Tuple {
  type Error = Error;

  fn try_from(w: WireTuple) -> Result<Self> {
    let subject = match (w.subject_id, w.subject_set) {
      (Some(id), _) => SubjectRef::Id(id),
      (None, Some(set)) => SubjectRef::Set {
        namespace: set.namespace,
        object:    set.object,
        relation:  set.relation,
      },
      (None, None) => {
        return Err(Error::Malformed(format!(
          "tuple {}:{}#{} has no subject",
          w.namespace, w.object, w.relation
        )));
      }
    };
    Ok(Tuple {
      namespace: w.namespace,
      object: w.object,
      relation: w.relation,
      subject,
    })
  }
}

// ─── Transactions ────────────────────────────────────────────────────────────

/// One element of the `PATCH /admin/relation-tuples` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePatch {
  pub action:         DeltaAction,
  pub relation_tuple: WireTuple,
}

impl From<&TupleDelta> for WirePatch {
  fn from(d: &TupleDelta) -> Self {
    Self { action: d.action, relation_tuple: WireTuple::from(&d.tuple) }
  }
}

// ─── Responses ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize)]
pub struct ListResponse {
  #[serde(default)]
  pub relation_tuples: Vec<WireTuple>,
  /// Empty on the last page.
  #[serde(default)]
  pub next_page_token: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CheckResponse {
  pub allowed: bool,
}

/// Keto's error envelope: `{"error": {"code": 404, "message": "..."}}`.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
  pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
  pub message: String,
  #[serde(default)]
  pub reason:  Option<String>,
}

impl ErrorDetail {
  pub fn describe(self) -> String {
    match self.reason {
      Some(reason) if !reason.is_empty() => {
        format!("{}: {reason}", self.message)
      }
      _ => self.message,
    }
  }
}

// ─── Query strings ───────────────────────────────────────────────────────────

fn push_subject(params: &mut Vec<(&'static str, String)>, subject: &SubjectRef) {
  match subject {
    SubjectRef::Id(id) => params.push(("subject_id", id.clone())),
    SubjectRef::Set { namespace, object, relation } => {
      params.push(("subject_set.namespace", namespace.clone()));
      params.push(("subject_set.object", object.clone()));
      params.push(("subject_set.relation", relation.clone()));
    }
  }
}

/// Query parameters for `GET /relation-tuples`; unset fields are omitted.
pub fn query_params(query: &TupleQuery) -> Vec<(&'static str, String)> {
  let mut params = Vec::new();
  let fields = [
    ("namespace", &query.namespace),
    ("object", &query.object),
    ("relation", &query.relation),
  ];
  for (key, value) in fields {
    if let Some(v) = value {
      params.push((key, v.clone()));
    }
  }
  if let Some(subject) = &query.subject {
    push_subject(&mut params, subject);
  }
  params
}

/// Query parameters for a check of exactly `tuple`.
pub fn tuple_params(tuple: &Tuple) -> Vec<(&'static str, String)> {
  let mut params = vec![
    ("namespace", tuple.namespace.clone()),
    ("object", tuple.object.clone()),
    ("relation", tuple.relation.clone()),
  ];
  push_subject(&mut params, &tuple.subject);
  params
}
