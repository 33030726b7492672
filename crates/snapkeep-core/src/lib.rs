//! Core types, the tuple store abstraction and the relationship mapper for
//! snapkeep.
//!
//! This crate knows nothing about HTTP or about any particular authorization
//! backend. Backends implement [`store::TupleStore`]; the HTTP layer talks to
//! [`mapper::RelationshipMapper`].

// Native `async fn` in traits; `Send` bounds are spelled out on the trait.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod mapper;
pub mod memory;
pub mod relation;
pub mod store;
pub mod tuple;

pub use error::{Error, Result};
pub use mapper::RelationshipMapper;
