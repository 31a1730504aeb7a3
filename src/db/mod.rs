//! Database module: conversation history persisted in SQLite.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `actor.rs`: the actor owning the pool, plus its cloneable handle

pub mod actor;
pub mod models;
pub mod schema;

pub use models::{DbMessage, NewMessage};
pub use schema::SQLITE_INIT;

pub use actor::{DbActorHandle, spawn};
