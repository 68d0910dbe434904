//! Workflow catalog — the fixed inventory of internal states and the ordered
//! phases that group them.
//!
//! The catalog is static and immutable for the process lifetime. Phases are
//! navigational grouping only: no transition-adjacency graph is enforced, and
//! any valid state may follow any other.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

// ─── States ──────────────────────────────────────────────────────────────────

/// The closed enumeration of internal workflow states.
///
/// Display labels are the upstream Spanish labels verbatim; `FromStr` accepts
/// exactly those labels and nothing else.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
pub enum InternalState {
  #[serde(rename = "AVISO SINIESTRO")]
  #[strum(serialize = "AVISO SINIESTRO")]
  AvisoSiniestro,
  #[serde(rename = "OBTENCIÓN SOPORTES")]
  #[strum(serialize = "OBTENCIÓN SOPORTES")]
  ObtencionSoportes,
  #[serde(rename = "ESTUDIO TÉCNICO CORREDORES")]
  #[strum(serialize = "ESTUDIO TÉCNICO CORREDORES")]
  EstudioTecnicoCorredores,
  #[serde(rename = "RADICACIÓN COMPAÑÍA")]
  #[strum(serialize = "RADICACIÓN COMPAÑÍA")]
  RadicacionCompania,
  #[serde(rename = "AJUSTADOR")]
  #[strum(serialize = "AJUSTADOR")]
  Ajustador,
  #[serde(rename = "DOCUMENTOS ADICIONALES")]
  #[strum(serialize = "DOCUMENTOS ADICIONALES")]
  DocumentosAdicionales,
  #[serde(rename = "DOCUMENTOS COMPLETOS")]
  #[strum(serialize = "DOCUMENTOS COMPLETOS")]
  DocumentosCompletos,
  #[serde(rename = "DEVOLUCIÓN DE DOCUMENTOS")]
  #[strum(serialize = "DEVOLUCIÓN DE DOCUMENTOS")]
  DevolucionDeDocumentos,
  #[serde(rename = "LIQUIDACIÓN")]
  #[strum(serialize = "LIQUIDACIÓN")]
  Liquidacion,
  #[serde(rename = "OBJECIÓN")]
  #[strum(serialize = "OBJECIÓN")]
  Objecion,
  #[serde(rename = "RECONSIDERACIÓN LIQUIDACIÓN")]
  #[strum(serialize = "RECONSIDERACIÓN LIQUIDACIÓN")]
  ReconsideracionLiquidacion,
  // Upstream label lacks the accent on RECONSIDERACION; kept verbatim.
  #[serde(rename = "RECONSIDERACION OBJECIÓN")]
  #[strum(serialize = "RECONSIDERACION OBJECIÓN")]
  ReconsideracionObjecion,
  #[serde(rename = "DESISTIMIENTO")]
  #[strum(serialize = "DESISTIMIENTO")]
  Desistimiento,
  #[serde(rename = "RATIFICACIÓN LIQUIDACIÓN")]
  #[strum(serialize = "RATIFICACIÓN LIQUIDACIÓN")]
  RatificacionLiquidacion,
  #[serde(rename = "RATIFICACIÓN OBJECIÓN")]
  #[strum(serialize = "RATIFICACIÓN OBJECIÓN")]
  RatificacionObjecion,
  #[serde(rename = "PRESCRIPCIÓN")]
  #[strum(serialize = "PRESCRIPCIÓN")]
  Prescripcion,
  #[serde(rename = "PROCESO JURÍDICO")]
  #[strum(serialize = "PROCESO JURÍDICO")]
  ProcesoJuridico,
  #[serde(rename = "FIRMA INDEMNIZACIÓN")]
  #[strum(serialize = "FIRMA INDEMNIZACIÓN")]
  FirmaIndemnizacion,
  #[serde(rename = "EN PROCESO PAGO INDEMNIZACIÓN")]
  #[strum(serialize = "EN PROCESO PAGO INDEMNIZACIÓN")]
  EnProcesoPagoIndemnizacion,
  #[serde(rename = "FINALIZADO")]
  #[strum(serialize = "FINALIZADO")]
  Finalizado,
  #[serde(rename = "PAGADO")]
  #[strum(serialize = "PAGADO")]
  Pagado,
}

impl InternalState {
  /// The state a freshly imported claim lands in when the secondary extract
  /// reports nothing usable.
  pub const DEFAULT_ON_IMPORT: InternalState = InternalState::AvisoSiniestro;

  /// Terminal states are an alerting convention only: the risk engine stops
  /// flagging them, but the transition engine will still move a claim out of
  /// one if asked.
  pub fn is_terminal(self) -> bool {
    matches!(self, InternalState::Pagado | InternalState::Finalizado)
  }

  /// The display label (same string `Display` produces).
  pub fn label(self) -> String { self.to_string() }
}

// ─── Phases ──────────────────────────────────────────────────────────────────

/// A named, ordered grouping of workflow states. Cosmetic and navigational
/// only; carries no transition semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowPhase {
  pub ordinal: u8,
  pub label:   &'static str,
  pub states:  &'static [InternalState],
}

use InternalState as S;

/// The fixed phase catalog, in workflow order.
pub const PHASES: &[WorkflowPhase] = &[
  WorkflowPhase {
    ordinal: 1,
    label:   "1. AVISO - SOPORTES - ESTUDIO",
    states:  &[
      S::AvisoSiniestro,
      S::ObtencionSoportes,
      S::EstudioTecnicoCorredores,
    ],
  },
  WorkflowPhase {
    ordinal: 2,
    label:   "2. RADICACIÓN - AJUSTE",
    states:  &[S::RadicacionCompania, S::Ajustador, S::DocumentosAdicionales],
  },
  WorkflowPhase {
    ordinal: 3,
    label:   "3. LIQUIDACIÓN - OBJECIÓN",
    states:  &[
      S::DocumentosCompletos,
      S::DevolucionDeDocumentos,
      S::Liquidacion,
      S::Objecion,
    ],
  },
  WorkflowPhase {
    ordinal: 4,
    label:   "4. RECONSIDERACIÓN",
    states:  &[
      S::ReconsideracionLiquidacion,
      S::ReconsideracionObjecion,
      S::Desistimiento,
    ],
  },
  WorkflowPhase {
    ordinal: 5,
    label:   "5. RATIFICACIÓN",
    states:  &[S::RatificacionLiquidacion, S::RatificacionObjecion],
  },
  WorkflowPhase {
    ordinal: 6,
    label:   "6. JURÍDICO - PRESCRIPCIÓN",
    states:  &[S::Prescripcion, S::ProcesoJuridico],
  },
  WorkflowPhase {
    ordinal: 7,
    label:   "7. PAGO - FINALIZADO",
    states:  &[
      S::FirmaIndemnizacion,
      S::EnProcesoPagoIndemnizacion,
      S::Finalizado,
      S::Pagado,
    ],
  },
];

/// The full phase catalog, in workflow order.
pub fn phases() -> &'static [WorkflowPhase] { PHASES }

/// Every state in the catalog, in phase order.
pub fn all_states() -> impl Iterator<Item = InternalState> {
  InternalState::iter()
}

/// The phase a state belongs to. Every state belongs to exactly one phase.
pub fn phase_of(state: InternalState) -> Option<&'static WorkflowPhase> {
  PHASES.iter().find(|p| p.states.contains(&state))
}

/// Whether `label` names a catalog state (exact match on the display label).
pub fn is_valid_state(label: &str) -> bool {
  label.parse::<InternalState>().is_ok()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_state_belongs_to_exactly_one_phase() {
    for state in all_states() {
      let count =
        PHASES.iter().filter(|p| p.states.contains(&state)).count();
      assert_eq!(count, 1, "{state} appears in {count} phases");
    }
  }

  #[test]
  fn phase_states_cover_the_enum() {
    let from_phases: usize = PHASES.iter().map(|p| p.states.len()).sum();
    assert_eq!(from_phases, all_states().count());
  }

  #[test]
  fn labels_round_trip() {
    for state in all_states() {
      let label = state.label();
      assert_eq!(label.parse::<InternalState>().unwrap(), state);
    }
  }

  #[test]
  fn unknown_label_is_rejected() {
    assert!(!is_valid_state("NOT_A_STATE"));
    assert!(!is_valid_state("pagado")); // labels are case-sensitive
    assert!(is_valid_state("PAGADO"));
    assert!(is_valid_state("DOCUMENTOS ADICIONALES"));
  }

  #[test]
  fn terminal_convention() {
    assert!(InternalState::Pagado.is_terminal());
    assert!(InternalState::Finalizado.is_terminal());
    assert!(!InternalState::Liquidacion.is_terminal());
    assert!(!InternalState::Prescripcion.is_terminal());
  }

  #[test]
  fn phase_of_is_ordered() {
    assert_eq!(phase_of(InternalState::AvisoSiniestro).unwrap().ordinal, 1);
    assert_eq!(phase_of(InternalState::Objecion).unwrap().ordinal, 3);
    assert_eq!(phase_of(InternalState::Pagado).unwrap().ordinal, 7);
  }
}
