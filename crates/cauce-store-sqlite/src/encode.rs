//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, workflow states and priorities
//! by their display labels, UUIDs as hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use cauce_core::{
  claim::{Claim, Priority, StateHistoryEntry, TimelineEvent},
  workflow::InternalState,
};

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_state(state: InternalState) -> String { state.to_string() }

pub fn decode_state(s: &str) -> Result<InternalState> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown workflow state: {s:?}")))
}

pub fn encode_priority(p: Priority) -> &'static str {
  match p {
    Priority::Alta => "Alta",
    Priority::Media => "Media",
    Priority::Baja => "Baja",
  }
}

pub fn decode_priority(s: &str) -> Result<Priority> {
  match s {
    "Alta" => Ok(Priority::Alta),
    "Media" => Ok(Priority::Media),
    "Baja" => Ok(Priority::Baja),
    other => Err(Error::Decode(format!("unknown priority: {other:?}"))),
  }
}

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `claims` row.
pub struct RawClaim {
  pub id_softseguros:         String,
  pub id_interno:             String,
  pub numero_siniestro:       String,
  pub poliza:                 String,
  pub asegurado:              String,
  pub estado_softseguros:     String,
  pub usuario_registro:       String,
  pub ultimo_seguimiento_raw: String,
  pub placa_bien:             String,
  pub ramo:                   String,
  pub aseguradora:            String,
  pub vendedor:               String,
  pub tecnico_asignado:       String,
  pub aliado_origen:          String,
  pub estado_interno:         String,
  pub last_state_change:      Option<String>,
  pub prioridad:              String,
  pub monto_reclamo:          f64,
  pub valor_deducible:        f64,
  pub valor_indemnizacion:    f64,
  pub fecha_ocurrencia:       Option<String>,
  pub updated_at:             String,
}

impl RawClaim {
  /// Decode the scalar columns and attach the already-decoded nested rows.
  pub fn into_claim(
    self,
    state_history: Vec<StateHistoryEntry>,
    timeline: Vec<TimelineEvent>,
  ) -> Result<Claim> {
    Ok(Claim {
      id_softseguros: self.id_softseguros,
      id_interno: self.id_interno,
      numero_siniestro: self.numero_siniestro,
      poliza: self.poliza,
      asegurado: self.asegurado,
      estado_softseguros: self.estado_softseguros,
      usuario_registro: self.usuario_registro,
      ultimo_seguimiento_raw: self.ultimo_seguimiento_raw,
      placa_bien: self.placa_bien,
      ramo: self.ramo,
      aseguradora: self.aseguradora,
      vendedor: self.vendedor,
      tecnico_asignado: self.tecnico_asignado,
      aliado_origen: self.aliado_origen,
      estado_interno: decode_state(&self.estado_interno)?,
      last_state_change: self
        .last_state_change
        .as_deref()
        .map(decode_dt)
        .transpose()?,
      state_history,
      prioridad: decode_priority(&self.prioridad)?,
      monto_reclamo: self.monto_reclamo,
      valor_deducible: self.valor_deducible,
      valor_indemnizacion: self.valor_indemnizacion,
      fecha_ocurrencia: self
        .fecha_ocurrencia
        .as_deref()
        .map(decode_dt)
        .transpose()?,
      updated_at: decode_dt(&self.updated_at)?,
      timeline,
    })
  }
}

/// Raw strings read directly from a `state_history` row.
pub struct RawHistoryEntry {
  pub claim_id:      String,
  pub state:         String,
  pub start_date:    String,
  pub end_date:      String,
  pub days_duration: i64,
  pub author:        String,
}

impl RawHistoryEntry {
  pub fn into_entry(self) -> Result<StateHistoryEntry> {
    Ok(StateHistoryEntry {
      state:         decode_state(&self.state)?,
      start_date:    decode_dt(&self.start_date)?,
      end_date:      decode_dt(&self.end_date)?,
      days_duration: self.days_duration,
      author:        self.author,
    })
  }
}

/// Raw strings read directly from a `timeline` row.
pub struct RawTimelineEvent {
  pub event_id:  String,
  pub claim_id:  String,
  pub date:      String,
  pub author:    String,
  pub text:      String,
  pub is_system: bool,
}

impl RawTimelineEvent {
  pub fn into_event(self) -> Result<TimelineEvent> {
    Ok(TimelineEvent {
      event_id:  decode_uuid(&self.event_id)?,
      date:      decode_dt(&self.date)?,
      author:    self.author,
      text:      self.text,
      is_system: self.is_system,
    })
  }
}
