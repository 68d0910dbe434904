//! SQLite backend for the Cauce claim store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. The transition commit — claim
//! header, closed dwell entry, system timeline event — runs inside a single
//! transaction, and both append paths are idempotent so a failed commit is
//! recovered by retrying it.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
