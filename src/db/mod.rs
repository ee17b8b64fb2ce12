//! Database module: the complaint table, its store and endpoint resolution.
//!
//! Layout:
//! - `models.rs`: row and form structs
//! - `schema.rs`: per-backend DDL and backend detection
//! - `store.rs`: CRUD over an sqlx `Any` pool
//! - `resolver.rs`: startup choice between Postgres and the local SQLite file

pub mod models;
pub mod resolver;
pub mod schema;
pub mod store;

pub use models::{ANONIMO, Denuncia, DenunciaForm};
pub use resolver::{ResolvedDatabase, Resolution};
pub use schema::Backend;
pub use store::DenunciaStore;
