//! Risk detection and read-side aggregation over a claim collection.
//!
//! Everything here is a pure projection, recomputed on every call. The
//! dataset is small and reads are infrequent, so there is no caching and no
//! incremental maintenance.

use std::collections::HashMap;

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::{claim::Claim, engine::ceil_days};

/// Days in the same state after which an open claim is flagged stagnant.
pub const STAGNATION_THRESHOLD_DAYS: i64 = 30;

/// Statutory filing period after the occurrence date.
pub const PRESCRIPTION_PERIOD_MONTHS: u32 = 24;

/// Days before the statutory deadline within which a claim is flagged.
pub const PRESCRIPTION_WINDOW_DAYS: i64 = 90;

// ─── Stagnation ──────────────────────────────────────────────────────────────

/// Whole days the claim has dwelt in its current state.
pub fn days_in_state(claim: &Claim, now: DateTime<Utc>) -> i64 {
  ceil_days(claim.effective_last_change(), now)
}

/// Stagnant: open (non-terminal) and over `threshold_days` in the same state.
pub fn is_stagnant_after(
  claim: &Claim,
  now: DateTime<Utc>,
  threshold_days: i64,
) -> bool {
  !claim.is_terminal() && days_in_state(claim, now) > threshold_days
}

/// [`is_stagnant_after`] with the standard 30-day threshold.
pub fn is_stagnant(claim: &Claim, now: DateTime<Utc>) -> bool {
  is_stagnant_after(claim, now, STAGNATION_THRESHOLD_DAYS)
}

// ─── Prescription ────────────────────────────────────────────────────────────

/// The statutory deadline: occurrence date plus two calendar years.
/// `None` when the claim has no occurrence date.
pub fn prescription_deadline(claim: &Claim) -> Option<DateTime<Utc>> {
  claim
    .fecha_ocurrencia
    .and_then(|d| d.checked_add_months(Months::new(PRESCRIPTION_PERIOD_MONTHS)))
}

/// Whole days until the deadline, ceiling; zero or negative once expired.
/// `None` when the claim has no occurrence date.
pub fn days_to_prescription(
  claim: &Claim,
  now: DateTime<Utc>,
) -> Option<i64> {
  let deadline = prescription_deadline(claim)?;
  Some((deadline - now).num_seconds().div_ceil(86_400))
}

/// Approaching the statutory deadline: open claim with strictly between zero
/// and [`PRESCRIPTION_WINDOW_DAYS`] days remaining.
///
/// Claims already past the deadline are excluded, matching upstream behavior;
/// callers wanting to surface expired claims use [`days_to_prescription`].
pub fn is_prescription_risk(claim: &Claim, now: DateTime<Utc>) -> bool {
  if claim.is_terminal() {
    return false;
  }
  match days_to_prescription(claim, now) {
    Some(days) => days > 0 && days < PRESCRIPTION_WINDOW_DAYS,
    None => false,
  }
}

// ─── Grouping ────────────────────────────────────────────────────────────────

/// The closed set of attributes a claim collection can be grouped by.
/// A typed accessor, not a free-form field lookup.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
  Asegurado,
  Ramo,
  Aseguradora,
  EstadoInterno,
  TecnicoAsignado,
  Vendedor,
}

impl GroupKey {
  /// Resolve a snake_case label to a key, for callers holding user input.
  pub fn from_label(label: &str) -> crate::Result<GroupKey> {
    label
      .parse()
      .map_err(|_| crate::Error::UnknownGroupKey(label.to_string()))
  }

  /// The grouping value this key extracts from a claim.
  pub fn value_of(self, claim: &Claim) -> String {
    match self {
      GroupKey::Asegurado => claim.asegurado.clone(),
      GroupKey::Ramo => claim.ramo.clone(),
      GroupKey::Aseguradora => claim.aseguradora.clone(),
      GroupKey::EstadoInterno => claim.estado_interno.to_string(),
      GroupKey::TecnicoAsignado => claim.tecnico_asignado.clone(),
      GroupKey::Vendedor => claim.vendedor.clone(),
    }
  }
}

/// Group `claims` by `key`, sorted descending by group size. Ties keep the
/// insertion order of each group's first occurrence (the sort is stable).
pub fn group_by<'a>(
  claims: &'a [Claim],
  key: GroupKey,
) -> Vec<(String, Vec<&'a Claim>)> {
  let mut groups: Vec<(String, Vec<&'a Claim>)> = Vec::new();
  let mut index: HashMap<String, usize> = HashMap::new();

  for claim in claims {
    let value = key.value_of(claim);
    match index.get(&value) {
      Some(&i) => groups[i].1.push(claim),
      None => {
        index.insert(value.clone(), groups.len());
        groups.push((value, vec![claim]));
      }
    }
  }

  groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
  groups
}

// ─── KPI rollup ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiData {
  /// Claimed amount summed over non-terminal claims.
  pub total_reclamado: f64,
  /// Share of terminal claims that paid out, as a percentage; 0.0 when no
  /// claim is terminal yet.
  pub tasa_exito:      f64,
  /// Stagnant-claim count at the standard threshold.
  pub casos_quietos:   usize,
}

/// Compute the dashboard rollup over `claims`.
pub fn kpis(claims: &[Claim], now: DateTime<Utc>) -> KpiData {
  let total_reclamado = claims
    .iter()
    .filter(|c| !c.is_terminal())
    .map(|c| c.monto_reclamo)
    .sum();

  let terminal: Vec<&Claim> =
    claims.iter().filter(|c| c.is_terminal()).collect();
  let tasa_exito = if terminal.is_empty() {
    0.0
  } else {
    let paid = terminal.iter().filter(|c| c.valor_indemnizacion > 0.0).count();
    paid as f64 / terminal.len() as f64 * 100.0
  };

  let casos_quietos = claims.iter().filter(|c| is_stagnant(c, now)).count();

  KpiData { total_reclamado, tasa_exito, casos_quietos }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
