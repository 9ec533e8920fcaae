//! SQLite backend for the petdir directory store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Multi-row writes (claim approval) run
//! inside a single SQLite transaction; the attempt counter is only ever moved
//! by guarded `UPDATE … RETURNING` statements.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
