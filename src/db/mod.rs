//! Database module: the credential store.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `traits.rs`: the store seam consumed by the credential engine
//! - `actor.rs`: ractor actor owning the pool, and its handle

pub mod actor;
pub mod models;
pub mod schema;
pub mod traits;

pub use models::{DbCredentialState, DbPluginCredential};
pub use schema::SQLITE_INIT;
pub use traits::CredentialStore;

pub use actor::{DbActorHandle, spawn};
