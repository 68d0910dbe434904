//! The `ClaimStore` trait.
//!
//! Implemented by storage backends (e.g. `cauce-store-sqlite`). Higher layers
//! depend on this abstraction, not on any concrete backend.
//!
//! The transition engine produces three logically coupled writes per applied
//! transition: the claim header, the closed history entry, and the system
//! timeline event. [`ClaimStore::commit_transition`] takes them as one unit
//! and promises all-or-nothing where the backend supports transactions; the
//! individual append operations are idempotent on retry so a failed commit is
//! recovered by re-issuing it.

use std::future::Future;

use crate::{
  claim::{Claim, StateHistoryEntry, TimelineEvent},
  engine::TransitionOutcome,
};

/// Counters reported by the re-import write path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
  pub inserted: usize,
  pub updated:  usize,
}

/// Abstraction over a claim store backend.
///
/// All methods return `Send` futures so the trait can be used from
/// multi-threaded async runtimes.
pub trait ClaimStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Load every claim with its nested history (chronological) and timeline
  /// (newest first).
  fn load_claims(
    &self,
  ) -> impl Future<Output = Result<Vec<Claim>, Self::Error>> + Send + '_;

  /// Fetch one claim by its external identifier. `None` if not found.
  fn get_claim<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Claim>, Self::Error>> + Send + 'a;

  // ── Independent writes ────────────────────────────────────────────────

  /// Persist the claim's scalar columns only; history and timeline rows are
  /// not touched.
  fn save_claim_header<'a>(
    &'a self,
    claim: &'a Claim,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Append one closed dwell entry. Idempotent: re-appending an entry with
  /// the same (claim, state, start) is a no-op.
  fn append_history_entry<'a>(
    &'a self,
    claim_id: &'a str,
    entry: &'a StateHistoryEntry,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Append one timeline event. Idempotent by event id.
  fn append_timeline_event<'a>(
    &'a self,
    claim_id: &'a str,
    event: &'a TimelineEvent,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Coupled writes ────────────────────────────────────────────────────

  /// Persist an applied transition — header, history entry, timeline event —
  /// as a single atomic unit.
  fn commit_transition<'a>(
    &'a self,
    outcome: &'a TransitionOutcome,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Import write paths ────────────────────────────────────────────────

  /// Upsert freshly reconciled records. Existing claims keep their workflow
  /// state, history, timeline and priority; only mirrored, classification
  /// and financial columns are overwritten. New identifiers are inserted
  /// whole.
  fn upsert_claims<'a>(
    &'a self,
    claims: &'a [Claim],
  ) -> impl Future<Output = Result<ImportStats, Self::Error>> + Send + 'a;

  /// Drop every stored claim and insert `claims` verbatim. The documented
  /// full-replace import: accumulated history and timeline are lost.
  fn replace_claims<'a>(
    &'a self,
    claims: &'a [Claim],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
