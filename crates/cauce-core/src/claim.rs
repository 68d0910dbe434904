//! Claim records and their append-only audit structures.
//!
//! A claim mirrors the authoritative source system (Softseguros extract) and
//! carries the internal workflow extension on top: current state, per-state
//! dwell history, and a newest-first timeline of events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflow::InternalState;

// ─── Priority ────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub enum Priority {
  #[serde(rename = "Alta")]
  Alta,
  #[default]
  #[serde(rename = "Media")]
  Media,
  #[serde(rename = "Baja")]
  Baja,
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// The role a session actor holds. `Aliado` is the restricted partner role:
/// its holders see only claims originating from their own partner code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
  Admin,
  Tecnico,
  Aliado,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id:        String,
  pub name:      String,
  pub email:     String,
  pub role:      Role,
  pub initials:  String,
  /// Partner code; only meaningful for [`Role::Aliado`].
  pub aliado_id: Option<String>,
}

// ─── Audit structures ────────────────────────────────────────────────────────

/// One closed dwell period in a state the claim has since left.
///
/// Created only by the transition engine, append-only, never mutated. The
/// currently occupied state has no entry; its dwell is still open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateHistoryEntry {
  pub state:         InternalState,
  pub start_date:    DateTime<Utc>,
  pub end_date:      DateTime<Utc>,
  /// Whole days, ceiling of the elapsed time; 0 for a same-day exit.
  pub days_duration: i64,
  /// The technician responsible during the dwell, not the transition actor.
  pub author:        String,
}

/// An entry on the claim's timeline. System events record automated audit
/// messages (state transitions, imports); the rest are user-authored notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
  pub event_id:  Uuid,
  pub date:      DateTime<Utc>,
  pub author:    String,
  pub text:      String,
  pub is_system: bool,
}

// ─── Claim ───────────────────────────────────────────────────────────────────

/// The unit of work: one insurance claim, source mirror plus workflow
/// extension. Field names follow the upstream domain vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
  // Identity.
  /// Externally assigned primary key; immutable and unique.
  pub id_softseguros: String,
  /// Internally derived id, a deterministic function of the external id.
  pub id_interno:     String,

  // Source mirror (display-only except for the identifier join).
  pub numero_siniestro:       String,
  pub poliza:                 String,
  pub asegurado:              String,
  pub estado_softseguros:     String,
  pub usuario_registro:       String,
  pub ultimo_seguimiento_raw: String,
  pub placa_bien:             String,

  // Classification.
  pub ramo:             String,
  pub aseguradora:      String,
  pub vendedor:         String,
  pub tecnico_asignado: String,
  pub aliado_origen:    String,

  // Workflow.
  pub estado_interno:    InternalState,
  /// Legacy records imported before dwell tracking may lack this; readers
  /// fall back to `updated_at` via [`Claim::effective_last_change`].
  pub last_state_change: Option<DateTime<Utc>>,
  pub state_history:     Vec<StateHistoryEntry>,
  pub prioridad:         Priority,

  // Financial, single currency.
  pub monto_reclamo:       f64,
  pub valor_deducible:     f64,
  pub valor_indemnizacion: f64,

  // Temporal.
  /// Absence disables prescription evaluation for this claim.
  pub fecha_ocurrencia: Option<DateTime<Utc>>,
  pub updated_at:       DateTime<Utc>,

  /// Newest first.
  pub timeline: Vec<TimelineEvent>,
}

impl Claim {
  /// Derive the internal id from the external one.
  pub fn internal_id_for(external_id: &str) -> String {
    format!("INT-{external_id}")
  }

  /// The timestamp the current dwell started, with the legacy fallback to
  /// `updated_at` for records that predate dwell tracking.
  pub fn effective_last_change(&self) -> DateTime<Utc> {
    self.last_state_change.unwrap_or(self.updated_at)
  }

  /// Net payable: gross indemnity minus deductible. Derived, never stored;
  /// may be transiently negative and is not clamped.
  pub fn neto_a_pagar(&self) -> f64 {
    self.valor_indemnizacion - self.valor_deducible
  }

  /// Whether the claim sits in a terminal state (alerting convention).
  pub fn is_terminal(&self) -> bool { self.estado_interno.is_terminal() }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::workflow::InternalState;

  pub(crate) fn sample_claim() -> Claim {
    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    Claim {
      id_softseguros: "SOFT-001".into(),
      id_interno: Claim::internal_id_for("SOFT-001"),
      numero_siniestro: "SIN-2023-882".into(),
      poliza: "AUTO-COL-9921".into(),
      asegurado: "Transportes Rápidos S.A.S".into(),
      estado_softseguros: "ABIERTO".into(),
      usuario_registro: "admin_ss".into(),
      ultimo_seguimiento_raw: "Documentación recibida".into(),
      placa_bien: "WXY-123".into(),
      ramo: "Automóviles".into(),
      aseguradora: "Seguros Bolívar".into(),
      vendedor: "Carlos Pérez".into(),
      tecnico_asignado: "Gonzalo Duque".into(),
      aliado_origen: "Seguros Bolívar".into(),
      estado_interno: InternalState::EstudioTecnicoCorredores,
      last_state_change: Some(t0),
      state_history: vec![],
      prioridad: Priority::Alta,
      monto_reclamo: 15_000_000.0,
      valor_deducible: 1_500_000.0,
      valor_indemnizacion: 0.0,
      fecha_ocurrencia: Some(t0),
      updated_at: t0,
      timeline: vec![],
    }
  }

  #[test]
  fn net_payable_is_not_clamped() {
    let mut claim = sample_claim();
    claim.valor_indemnizacion = 1_000_000.0;
    claim.valor_deducible = 1_500_000.0;
    assert_eq!(claim.neto_a_pagar(), -500_000.0);
  }

  #[test]
  fn effective_last_change_falls_back_to_updated_at() {
    let mut claim = sample_claim();
    let updated = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    claim.last_state_change = None;
    claim.updated_at = updated;
    assert_eq!(claim.effective_last_change(), updated);
  }

  #[test]
  fn state_serializes_as_its_label() {
    let claim = sample_claim();
    let json = serde_json::to_value(&claim).unwrap();
    assert_eq!(json["estado_interno"], "ESTUDIO TÉCNICO CORREDORES");
    assert_eq!(json["prioridad"], "Alta");
  }
}
