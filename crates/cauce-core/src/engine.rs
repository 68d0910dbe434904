//! State transition engine — the sole writer of a claim's workflow triplet
//! (current state, dwell history, timeline).
//!
//! Every operation is pure computation over an in-memory claim: `now` is a
//! parameter, nothing is persisted here. A successful transition hands back
//! the updated claim together with the two audit rows it produced, so the
//! store can commit all three as one unit (see `ClaimStore::commit_transition`).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  claim::{Claim, StateHistoryEntry, TimelineEvent},
  workflow::InternalState,
};

/// Author recorded on automated timeline events.
pub const SYSTEM_AUTHOR: &str = "Sistema";

// ─── Outcome types ───────────────────────────────────────────────────────────

/// The three logically coupled results of an applied transition.
///
/// `claim` already contains the new history entry and timeline event; they
/// are carried separately as well so a store can issue the header update and
/// the two appends without diffing.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
  pub claim:          Claim,
  pub history_entry:  StateHistoryEntry,
  pub timeline_event: TimelineEvent,
}

/// Result of asking for a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
  /// Target equals the current state; the claim is untouched.
  Unchanged,
  Applied(Box<TransitionOutcome>),
}

// ─── Duration arithmetic ─────────────────────────────────────────────────────

/// Whole days between two instants, ceiling, never negative.
/// A same-day span yields 0.
pub fn ceil_days(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
  let secs = (to - from).num_seconds();
  if secs <= 0 { 0 } else { secs.div_ceil(86_400) }
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// Move `claim` to `target`, closing the dwell on the outgoing state.
///
/// The closed history entry's author is the claim's assigned technician —
/// the party responsible during the dwell — while the system timeline event
/// names `acting_user`, the actor performing the change.
pub fn transition(
  claim: &Claim,
  target: InternalState,
  acting_user: &str,
  now: DateTime<Utc>,
) -> Transition {
  if target == claim.estado_interno {
    return Transition::Unchanged;
  }

  let outgoing = claim.estado_interno;
  let last_change = claim.effective_last_change();

  let history_entry = StateHistoryEntry {
    state:         outgoing,
    start_date:    last_change,
    end_date:      now,
    days_duration: ceil_days(last_change, now),
    author:        claim.tecnico_asignado.clone(),
  };

  let timeline_event = TimelineEvent {
    event_id:  Uuid::new_v4(),
    date:      now,
    author:    SYSTEM_AUTHOR.to_string(),
    text:      format!(
      "Cambio de estado: {outgoing} → {target} (por {acting_user})."
    ),
    is_system: true,
  };

  let mut updated = claim.clone();
  updated.estado_interno = target;
  updated.last_state_change = Some(now);
  updated.updated_at = now;
  updated.state_history.push(history_entry.clone());
  updated.timeline.insert(0, timeline_event.clone());

  Transition::Applied(Box::new(TransitionOutcome {
    claim: updated,
    history_entry,
    timeline_event,
  }))
}

/// [`transition`] for callers holding a raw state label.
///
/// Fails with [`Error::InvalidState`] — and touches nothing — when the label
/// is not in the workflow catalog.
pub fn transition_to_label(
  claim: &Claim,
  target_label: &str,
  acting_user: &str,
  now: DateTime<Utc>,
) -> Result<Transition> {
  let target: InternalState = target_label
    .parse()
    .map_err(|_| Error::InvalidState(target_label.to_string()))?;
  Ok(transition(claim, target, acting_user, now))
}

/// Append a user-authored note. Touches `updated_at` only; state and history
/// are left alone.
pub fn add_note(
  claim: &Claim,
  author: &str,
  text: &str,
  now: DateTime<Utc>,
) -> (Claim, TimelineEvent) {
  let event = TimelineEvent {
    event_id:  Uuid::new_v4(),
    date:      now,
    author:    author.to_string(),
    text:      text.to_string(),
    is_system: false,
  };

  let mut updated = claim.clone();
  updated.timeline.insert(0, event.clone());
  updated.updated_at = now;

  (updated, event)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;
  use crate::claim::Priority;

  fn claim_at(last_change: DateTime<Utc>) -> Claim {
    Claim {
      id_softseguros: "SOFT-010".into(),
      id_interno: Claim::internal_id_for("SOFT-010"),
      numero_siniestro: "SIN-2024-001".into(),
      poliza: "POL-1".into(),
      asegurado: "Acme S.A.".into(),
      estado_softseguros: "ABIERTO".into(),
      usuario_registro: "admin_ss".into(),
      ultimo_seguimiento_raw: String::new(),
      placa_bien: "ABC-123".into(),
      ramo: "Automóviles".into(),
      aseguradora: "Sura".into(),
      vendedor: "Ana López".into(),
      tecnico_asignado: "Gonzalo Duque".into(),
      aliado_origen: "Sura".into(),
      estado_interno: InternalState::Ajustador,
      last_state_change: Some(last_change),
      state_history: vec![],
      prioridad: Priority::Media,
      monto_reclamo: 1_000_000.0,
      valor_deducible: 0.0,
      valor_indemnizacion: 0.0,
      fecha_ocurrencia: None,
      updated_at: last_change,
      timeline: vec![],
    }
  }

  #[test]
  fn transition_closes_dwell_on_outgoing_state() {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let now = start + Duration::days(4) + Duration::hours(3);
    let claim = claim_at(start);

    let Transition::Applied(outcome) = transition(
      &claim,
      InternalState::DocumentosAdicionales,
      "Maria Gerente",
      now,
    ) else {
      panic!("expected an applied transition")
    };

    assert_eq!(outcome.claim.estado_interno, InternalState::DocumentosAdicionales);
    assert_eq!(outcome.claim.last_state_change, Some(now));
    assert_eq!(outcome.claim.updated_at, now);

    // Exactly one history entry, describing the state just left.
    assert_eq!(outcome.claim.state_history.len(), 1);
    let entry = &outcome.history_entry;
    assert_eq!(entry.state, InternalState::Ajustador);
    assert_eq!(entry.start_date, start);
    assert_eq!(entry.end_date, now);
    assert_eq!(entry.days_duration, 5); // 4d3h → ceiling
    // Author is the responsible technician, not the acting user.
    assert_eq!(entry.author, "Gonzalo Duque");

    // Newest-first system event naming both states and the actor.
    let event = &outcome.claim.timeline[0];
    assert!(event.is_system);
    assert_eq!(event.author, SYSTEM_AUTHOR);
    assert!(event.text.contains("AJUSTADOR"));
    assert!(event.text.contains("DOCUMENTOS ADICIONALES"));
    assert!(event.text.contains("Maria Gerente"));
  }

  #[test]
  fn same_state_transition_is_a_no_op() {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let claim = claim_at(start);
    let result = transition(
      &claim,
      InternalState::Ajustador,
      "Maria Gerente",
      start + Duration::days(1),
    );
    assert_eq!(result, Transition::Unchanged);
  }

  #[test]
  fn invalid_label_is_rejected_without_mutation() {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let claim = claim_at(start);
    let err =
      transition_to_label(&claim, "NOT_A_STATE", "Maria Gerente", start)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidState(ref s) if s == "NOT_A_STATE"));
  }

  #[test]
  fn same_day_transition_has_zero_duration() {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let claim = claim_at(start);
    let Transition::Applied(outcome) = transition(
      &claim,
      InternalState::Liquidacion,
      "Maria Gerente",
      start,
    ) else {
      panic!("expected an applied transition")
    };
    assert_eq!(outcome.history_entry.days_duration, 0);
  }

  #[test]
  fn legacy_claim_falls_back_to_updated_at() {
    let updated = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let mut claim = claim_at(updated);
    claim.last_state_change = None;

    let now = updated + Duration::days(2);
    let Transition::Applied(outcome) =
      transition(&claim, InternalState::Liquidacion, "Maria Gerente", now)
    else {
      panic!("expected an applied transition")
    };
    assert_eq!(outcome.history_entry.start_date, updated);
    assert_eq!(outcome.history_entry.days_duration, 2);
  }

  #[test]
  fn add_note_prepends_and_bumps_updated_at() {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let claim = claim_at(start);
    let now = start + Duration::hours(1);

    let (updated, event) =
      add_note(&claim, "Gonzalo Duque", "Revisando cobertura.", now);
    assert_eq!(updated.timeline.len(), 1);
    assert_eq!(updated.timeline[0], event);
    assert!(!event.is_system);
    assert_eq!(updated.updated_at, now);
    assert_eq!(updated.estado_interno, claim.estado_interno);
    assert!(updated.state_history.is_empty());
  }

  #[test]
  fn ceil_days_clamps_negative_spans() {
    let a = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
    let b = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    assert_eq!(ceil_days(a, b), 0);
    assert_eq!(ceil_days(b, a), 1);
  }
}
