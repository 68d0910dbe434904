//! Multi-dimensional filtering over the claim set.
//!
//! The criteria object is owned by the read-side session and recomputed on
//! every mutation; nothing here is persisted. Dimensions AND together, and
//! membership within one dimension is OR. An empty set ignores its dimension.

use serde::{Deserialize, Serialize};

use crate::{
  claim::{Claim, Role, User},
  workflow::InternalState,
};

/// A free-text term plus independent multi-select sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
  /// Case-insensitive substring match over claim number, policy, asset tag
  /// and insured name. Empty matches everything.
  pub search_term: String,
  pub ramo:        Vec<String>,
  pub aseguradora: Vec<String>,
  pub estado:      Vec<InternalState>,
  pub tecnico:     Vec<String>,
  pub aliado:      Vec<String>,
}

impl FilterCriteria {
  fn matches(&self, claim: &Claim) -> bool {
    if !self.search_term.is_empty() {
      let term = self.search_term.to_lowercase();
      let hit = claim.numero_siniestro.to_lowercase().contains(&term)
        || claim.poliza.to_lowercase().contains(&term)
        || claim.placa_bien.to_lowercase().contains(&term)
        || claim.asegurado.to_lowercase().contains(&term);
      if !hit {
        return false;
      }
    }

    if !self.ramo.is_empty() && !self.ramo.contains(&claim.ramo) {
      return false;
    }
    if !self.aseguradora.is_empty()
      && !self.aseguradora.contains(&claim.aseguradora)
    {
      return false;
    }
    if !self.estado.is_empty() && !self.estado.contains(&claim.estado_interno)
    {
      return false;
    }
    if !self.tecnico.is_empty()
      && !self.tecnico.contains(&claim.tecnico_asignado)
    {
      return false;
    }
    if !self.aliado.is_empty() && !self.aliado.contains(&claim.aliado_origen)
    {
      return false;
    }

    true
  }
}

/// Whether `user` is allowed to see `claim` at all. Partner-role actors are
/// scoped to their own originating-partner code.
pub fn visible_to(claim: &Claim, user: &User) -> bool {
  match user.role {
    Role::Aliado => {
      user.aliado_id.as_deref() == Some(claim.aliado_origen.as_str())
    }
    Role::Admin | Role::Tecnico => true,
  }
}

/// Apply `criteria` for `user`, preserving input order.
pub fn apply<'a>(
  claims: &'a [Claim],
  criteria: &FilterCriteria,
  user: &User,
) -> Vec<&'a Claim> {
  claims
    .iter()
    .filter(|c| visible_to(c, user) && criteria.matches(c))
    .collect()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
