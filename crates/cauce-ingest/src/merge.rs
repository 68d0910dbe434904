//! The merge itself: primary rows joined against the secondary sheet.
//!
//! The primary extract is authoritative for identity and financial fields;
//! the secondary sheet contributes management/assignment fields. Join key is
//! the shared identifier column, trimmed, case-sensitive.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use cauce_core::{
  claim::{Claim, Priority},
  workflow::InternalState,
};

use crate::{
  row::{Row, cell_of, text_of},
  scalar::{parse_currency, parse_date, try_parse_date},
};

// Recognized column names, exactly as the extracts spell them.
const COL_ID: &str = "IDENTIFICADOR";
const COL_CLAIM_NUMBER: &str = "NÚMERO DE SINIESTRO";
const COL_POLICY: &str = "PÓLIZA";
const COLS_INSURED: &[&str] = &["NOMBRE ASEGURADO", "ASEGURADO"];
const COL_STATUS: &str = "ESTADO";
const COL_REGISTERED_BY: &str = "USUARIO REGISTRA SINIESTRO";
const COL_LAST_FOLLOWUP: &str = "ÚLTIMO SEGUIMIENTO";
const COL_ASSET: &str = "RIESGO";
const COLS_LINE: &[&str] = &["SUBRAMO", "RAMO"];
const COL_INSURER: &str = "ASEGURADORA";
const COL_SALESPERSON: &str = "CLIENTE";
const COL_CLAIMED: &str = "MONTO RECLAMO";
const COL_DEDUCTIBLE: &str = "DEDUCIBLE";
const COL_INDEMNITY: &str = "VALOR INDEMNIZACIÓN";
const COL_OCCURRENCE: &str = "FECHA DEL SINIESTRO";

const COL_MGMT_RESPONSIBLE: &str = "Responsable";
const COL_MGMT_STATE: &str = "ESTADO ULTIMA GESTION";
const COL_MGMT_LAST_FOLLOWUP: &str = "Fecha Ultimo Seguimiento";

const UNASSIGNED: &str = "Sin Asignar";

// ─── Output types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
  /// Primary rows seen, including the skipped ones.
  pub total_rows:   usize,
  /// Unified claim records produced.
  pub merged:       usize,
  /// Primary rows dropped for lacking an identifier.
  pub skipped_rows: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MergeOutput {
  pub claims: Vec<Claim>,
  pub stats:  MergeStats,
}

// ─── Merge ───────────────────────────────────────────────────────────────────

/// Reconcile the two extracts into unified claim records.
///
/// Every produced record is fresh: empty history and timeline, default
/// priority. Rows without an identifier are counted and dropped, not
/// reported individually. `now` is the fallback for unparseable dates and
/// becomes each record's `updated_at`.
pub fn merge(
  primary: &[Row],
  secondary: &[Row],
  now: DateTime<Utc>,
) -> MergeOutput {
  // Index the management sheet by trimmed identifier. Last write wins on
  // duplicate keys.
  let mut by_id: HashMap<String, &Row> = HashMap::new();
  for row in secondary {
    if let Some(id) = row.get(COL_ID).and_then(|c| c.as_text()) {
      by_id.insert(id, row);
    }
  }

  let mut stats = MergeStats { total_rows: primary.len(), ..Default::default() };
  let mut claims = Vec::with_capacity(primary.len());

  for row in primary {
    let id = text_of(row, &[COL_ID]);
    if id.is_empty() {
      stats.skipped_rows += 1;
      debug!("skipping primary row without identifier");
      continue;
    }

    claims.push(merge_row(&id, row, by_id.get(id.as_str()).copied(), now));
  }

  stats.merged = claims.len();
  debug!(
    total = stats.total_rows,
    merged = stats.merged,
    skipped = stats.skipped_rows,
    "reconciled extracts"
  );

  MergeOutput { claims, stats }
}

fn merge_row(
  id: &str,
  row: &Row,
  mgmt: Option<&Row>,
  now: DateTime<Utc>,
) -> Claim {
  let insurer = {
    let v = text_of(row, &[COL_INSURER]);
    if v.is_empty() { "Sin Aseguradora".to_string() } else { v }
  };
  let line = {
    let v = text_of(row, COLS_LINE);
    if v.is_empty() { "Sin Ramo".to_string() } else { v }
  };
  let status = {
    let v = text_of(row, &[COL_STATUS]);
    if v.is_empty() { "ABIERTO".to_string() } else { v }
  };

  let tecnico = mgmt
    .map(|m| {
      let v = text_of(m, &[COL_MGMT_RESPONSIBLE]);
      if v.is_empty() { UNASSIGNED.to_string() } else { v }
    })
    .unwrap_or_else(|| UNASSIGNED.to_string());

  let estado_interno = mgmt
    .map(|m| text_of(m, &[COL_MGMT_STATE]))
    .filter(|label| !label.is_empty())
    .map(|label| {
      label.parse::<InternalState>().unwrap_or_else(|_| {
        debug!(%id, %label, "unrecognized management state, using default");
        InternalState::DEFAULT_ON_IMPORT
      })
    })
    .unwrap_or(InternalState::DEFAULT_ON_IMPORT);

  let last_state_change = mgmt
    .and_then(|m| cell_of(m, &[COL_MGMT_LAST_FOLLOWUP]))
    .map(|c| parse_date(c, now))
    .unwrap_or(now);

  // Occurrence drives prescription risk: an absent cell stays absent, only
  // present-but-unparseable cells take the lossy now fallback.
  let fecha_ocurrencia = cell_of(row, &[COL_OCCURRENCE])
    .filter(|c| !c.is_empty())
    .map(|c| try_parse_date(c).unwrap_or(now));

  Claim {
    id_softseguros: id.to_string(),
    id_interno: Claim::internal_id_for(id),
    numero_siniestro: text_of(row, &[COL_CLAIM_NUMBER]),
    poliza: text_of(row, &[COL_POLICY]),
    asegurado: text_of(row, COLS_INSURED),
    estado_softseguros: status,
    usuario_registro: text_of(row, &[COL_REGISTERED_BY]),
    ultimo_seguimiento_raw: text_of(row, &[COL_LAST_FOLLOWUP]),
    placa_bien: text_of(row, &[COL_ASSET]),
    ramo: line,
    aseguradora: insurer.clone(),
    vendedor: text_of(row, &[COL_SALESPERSON]),
    tecnico_asignado: tecnico,
    aliado_origen: insurer,
    estado_interno,
    last_state_change: Some(last_state_change),
    state_history: Vec::new(),
    prioridad: Priority::Media,
    monto_reclamo: parse_currency(
      cell_of(row, &[COL_CLAIMED]).unwrap_or(&crate::row::Cell::Empty),
    ),
    valor_deducible: parse_currency(
      cell_of(row, &[COL_DEDUCTIBLE]).unwrap_or(&crate::row::Cell::Empty),
    ),
    valor_indemnizacion: parse_currency(
      cell_of(row, &[COL_INDEMNITY]).unwrap_or(&crate::row::Cell::Empty),
    ),
    fecha_ocurrencia,
    updated_at: now,
    timeline: Vec::new(),
  }
}

// ─── Re-import policy ────────────────────────────────────────────────────────

/// Merge freshly reconciled records against the claims already in the store,
/// in memory.
///
/// For an identifier that already exists, the fresh record's mirrored,
/// classification and financial fields win while the existing record keeps
/// its workflow state, dwell history, timeline and priority — a re-import
/// never erases accumulated workflow bookkeeping. New identifiers pass
/// through untouched. (The raw full-replace output is simply [`merge`]'s
/// result.)
pub fn merge_with_existing(
  fresh: Vec<Claim>,
  existing: &[Claim],
) -> Vec<Claim> {
  let by_id: HashMap<&str, &Claim> = existing
    .iter()
    .map(|c| (c.id_softseguros.as_str(), c))
    .collect();

  fresh
    .into_iter()
    .map(|mut claim| {
      if let Some(prior) = by_id.get(claim.id_softseguros.as_str()) {
        claim.estado_interno = prior.estado_interno;
        claim.last_state_change = prior.last_state_change;
        claim.state_history = prior.state_history.clone();
        claim.timeline = prior.timeline.clone();
        claim.prioridad = prior.prioridad;
      }
      claim
    })
    .collect()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use uuid::Uuid;

  use super::*;
  use crate::row::Cell;

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
  }

  fn rows(json: &str) -> Vec<Row> {
    serde_json::from_str(json).expect("test rows")
  }

  #[test]
  fn primary_row_without_secondary_match_gets_defaults() {
    let primary = rows(
      r#"[{"IDENTIFICADOR": "ABC-1", "MONTO RECLAMO": "$5,000,000"}]"#,
    );
    let output = merge(&primary, &[], now());

    assert_eq!(output.stats.total_rows, 1);
    assert_eq!(output.stats.merged, 1);
    assert_eq!(output.stats.skipped_rows, 0);

    let claim = &output.claims[0];
    assert_eq!(claim.id_softseguros, "ABC-1");
    assert_eq!(claim.id_interno, "INT-ABC-1");
    assert_eq!(claim.monto_reclamo, 5_000_000.0);
    assert_eq!(claim.tecnico_asignado, "Sin Asignar");
    assert_eq!(claim.estado_interno, InternalState::DEFAULT_ON_IMPORT);
    assert_eq!(claim.ramo, "Sin Ramo");
    assert_eq!(claim.aseguradora, "Sin Aseguradora");
    assert_eq!(claim.estado_softseguros, "ABIERTO");
    assert!(claim.state_history.is_empty());
    assert!(claim.timeline.is_empty());
    assert_eq!(claim.fecha_ocurrencia, None);
    assert_eq!(claim.numero_siniestro, "");
  }

  #[test]
  fn secondary_match_contributes_management_fields() {
    let primary = rows(
      r#"[{"IDENTIFICADOR": " SOFT-1 ",
           "NÚMERO DE SINIESTRO": "SIN-2023-882",
           "PÓLIZA": "AUTO-COL-9921",
           "NOMBRE ASEGURADO": "Transportes Rápidos S.A.S",
           "SUBRAMO": "Automóviles",
           "ASEGURADORA": "Seguros Bolívar",
           "FECHA DEL SINIESTRO": "12/05/2023"}]"#,
    );
    let secondary = rows(
      r#"[{"IDENTIFICADOR": "SOFT-1",
           "Responsable": "Gonzalo Duque",
           "ESTADO ULTIMA GESTION": "DOCUMENTOS ADICIONALES",
           "Fecha Ultimo Seguimiento": "2024-05-20"}]"#,
    );

    let output = merge(&primary, &secondary, now());
    let claim = &output.claims[0];

    // The identifier join trims whitespace.
    assert_eq!(claim.id_softseguros, "SOFT-1");
    assert_eq!(claim.tecnico_asignado, "Gonzalo Duque");
    assert_eq!(claim.estado_interno, InternalState::DocumentosAdicionales);
    assert_eq!(
      claim.last_state_change,
      Some(Utc.with_ymd_and_hms(2024, 5, 20, 0, 0, 0).unwrap())
    );
    assert_eq!(
      claim.fecha_ocurrencia,
      Some(Utc.with_ymd_and_hms(2023, 5, 12, 0, 0, 0).unwrap())
    );
    assert_eq!(claim.aliado_origen, "Seguros Bolívar");
  }

  #[test]
  fn rows_without_identifier_are_counted_and_dropped() {
    let primary = rows(
      r#"[{"IDENTIFICADOR": "A"},
          {"IDENTIFICADOR": ""},
          {"PÓLIZA": "no id here"}]"#,
    );
    let output = merge(&primary, &[], now());
    assert_eq!(output.stats.total_rows, 3);
    assert_eq!(output.stats.merged, 1);
    assert_eq!(output.stats.skipped_rows, 2);
  }

  #[test]
  fn duplicate_secondary_keys_last_write_wins() {
    let primary = rows(r#"[{"IDENTIFICADOR": "A"}]"#);
    let secondary = rows(
      r#"[{"IDENTIFICADOR": "A", "Responsable": "Primero"},
          {"IDENTIFICADOR": "A", "Responsable": "Segundo"}]"#,
    );
    let output = merge(&primary, &secondary, now());
    assert_eq!(output.claims[0].tecnico_asignado, "Segundo");
  }

  #[test]
  fn unrecognized_management_state_falls_back_to_default() {
    let primary = rows(r#"[{"IDENTIFICADOR": "A"}]"#);
    let secondary = rows(
      r#"[{"IDENTIFICADOR": "A", "ESTADO ULTIMA GESTION": "PENDIENTE"}]"#,
    );
    let output = merge(&primary, &secondary, now());
    assert_eq!(
      output.claims[0].estado_interno,
      InternalState::DEFAULT_ON_IMPORT
    );
  }

  #[test]
  fn occurrence_date_from_spreadsheet_serial() {
    let primary = rows(
      r#"[{"IDENTIFICADOR": "A", "FECHA DEL SINIESTRO": 45292}]"#,
    );
    let output = merge(&primary, &[], now());
    assert_eq!(
      output.claims[0].fecha_ocurrencia,
      Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    );
  }

  #[test]
  fn unparseable_occurrence_date_substitutes_now() {
    let primary = rows(
      r#"[{"IDENTIFICADOR": "A", "FECHA DEL SINIESTRO": "sin fecha"}]"#,
    );
    let output = merge(&primary, &[], now());
    assert_eq!(output.claims[0].fecha_ocurrencia, Some(now()));
  }

  #[test]
  fn reimport_is_identical_except_updated_at() {
    let primary = rows(
      r#"[{"IDENTIFICADOR": "A", "MONTO RECLAMO": 1000,
           "ASEGURADORA": "Sura"}]"#,
    );
    let first = merge(&primary, &[], now());
    let later = now() + chrono::Duration::hours(1);
    let second = merge(&primary, &[], later);

    let mut a = first.claims[0].clone();
    let mut b = second.claims[0].clone();
    assert_ne!(a.updated_at, b.updated_at);
    a.updated_at = b.updated_at;
    b.last_state_change = a.last_state_change; // both are the now fallback
    assert_eq!(a, b);
  }

  #[test]
  fn merge_with_existing_preserves_workflow_bookkeeping() {
    let primary = rows(
      r#"[{"IDENTIFICADOR": "A", "MONTO RECLAMO": 2000,
           "ASEGURADORA": "Chubb"},
          {"IDENTIFICADOR": "B"}]"#,
    );
    let fresh = merge(&primary, &[], now()).claims;

    let mut prior = fresh[0].clone();
    prior.estado_interno = InternalState::Liquidacion;
    prior.monto_reclamo = 1_000.0; // stale financial value, should be replaced
    prior.prioridad = Priority::Alta;
    prior.timeline.push(cauce_core::claim::TimelineEvent {
      event_id:  Uuid::new_v4(),
      date:      now(),
      author:    "Gonzalo Duque".into(),
      text:      "Nota previa.".into(),
      is_system: false,
    });

    let merged = merge_with_existing(fresh, std::slice::from_ref(&prior));

    let a = &merged[0];
    assert_eq!(a.estado_interno, InternalState::Liquidacion);
    assert_eq!(a.prioridad, Priority::Alta);
    assert_eq!(a.timeline.len(), 1);
    assert_eq!(a.monto_reclamo, 2_000.0); // financial field refreshed

    // New identifier passes through as a fresh record.
    let b = &merged[1];
    assert_eq!(b.id_softseguros, "B");
    assert_eq!(b.estado_interno, InternalState::DEFAULT_ON_IMPORT);
  }
}
