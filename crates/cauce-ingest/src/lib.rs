//! Record reconciler for Cauce.
//!
//! Joins two independently maintained tabular extracts — the authoritative
//! source export and the management/assignment sheet — into unified claim
//! records, keyed by a shared identifier column. Pure and synchronous; no
//! file or database dependencies. Callers hand in row sets (one map of
//! column name to raw cell per row) however they obtained them.
//!
//! Parsing is deliberately lenient: a bad cell never rejects its row, and a
//! bad row never aborts the import. Unparseable currency becomes zero and
//! unparseable dates become the import timestamp; both fallbacks are lossy
//! and documented.
//!
//! # Quick start
//!
//! ```no_run
//! use cauce_ingest::{Row, merge};
//!
//! let primary: Vec<Row> = serde_json::from_str("[]").unwrap();
//! let secondary: Vec<Row> = serde_json::from_str("[]").unwrap();
//! let output = merge(&primary, &secondary, chrono::Utc::now());
//! println!("{} claims from {} rows", output.claims.len(), output.stats.total_rows);
//! ```

mod merge;
mod row;
mod scalar;

pub use merge::{MergeOutput, MergeStats, merge, merge_with_existing};
pub use row::{Cell, Row};
pub use scalar::{parse_currency, parse_date};
