//! `cauce` — command-line driver for the Cauce claims tracker.
//!
//! # Usage
//!
//! ```
//! cauce --db cauce.db import softseguros.json gestion.json
//! cauce --db cauce.db list --stagnant
//! cauce --db cauce.db transition SOFT-001 "LIQUIDACIÓN" --user "Maria Gerente"
//! cauce --db cauce.db report
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use strum::IntoEnumIterator;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use cauce_core::{
  claim::Claim,
  engine::{self, Transition},
  filter::FilterCriteria,
  risk::{self, GroupKey},
  store::ClaimStore,
  workflow::InternalState,
};
use cauce_ingest::{Row, merge, merge_with_existing};
use cauce_store_sqlite::SqliteStore;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "cauce", about = "Claims workflow tracker")]
struct Args {
  /// Path to the SQLite store file.
  #[arg(long, env = "CAUCE_DB", default_value = "cauce.db")]
  db: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Reconcile two JSON extracts and write them to the store.
  Import {
    /// Primary (Softseguros) extract: a JSON array of row objects.
    primary: PathBuf,
    /// Secondary (management) extract: a JSON array of row objects.
    secondary: PathBuf,
    /// Full replace: drop every stored claim first. Accumulated history and
    /// timeline are lost; without this flag imports upsert and preserve
    /// workflow state.
    #[arg(long)]
    replace: bool,
  },

  /// List claims, optionally filtered.
  List {
    /// Case-insensitive search over claim number, policy, asset tag and
    /// insured name.
    #[arg(long)]
    search: Option<String>,
    /// Restrict to one or more internal state labels.
    #[arg(long)]
    estado: Vec<String>,
    /// Only claims stagnant past the 30-day threshold.
    #[arg(long)]
    stagnant: bool,
    /// Only claims inside the prescription-risk window.
    #[arg(long)]
    risk: bool,
  },

  /// Show one claim with its dwell history and timeline.
  Show { id: String },

  /// Move a claim to a new workflow state.
  Transition {
    id: String,
    /// Target state label, e.g. "LIQUIDACIÓN".
    state: String,
    #[arg(long)]
    user: String,
  },

  /// Append a note to a claim's timeline.
  Note {
    id:   String,
    text: String,
    #[arg(long)]
    user: String,
  },

  /// KPI rollup and per-dimension group counts.
  Report {
    /// Restrict the group counts to one dimension, e.g. "aseguradora".
    #[arg(long)]
    by: Option<String>,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let store = SqliteStore::open(&args.db)
    .await
    .with_context(|| format!("opening store {}", args.db.display()))?;

  match args.command {
    Command::Import { primary, secondary, replace } => {
      run_import(&store, &primary, &secondary, replace).await
    }
    Command::List { search, estado, stagnant, risk } => {
      run_list(&store, search, estado, stagnant, risk).await
    }
    Command::Show { id } => run_show(&store, &id).await,
    Command::Transition { id, state, user } => {
      run_transition(&store, &id, &state, &user).await
    }
    Command::Note { id, text, user } => {
      run_note(&store, &id, &text, &user).await
    }
    Command::Report { by } => run_report(&store, by.as_deref()).await,
  }
}

// ─── Commands ─────────────────────────────────────────────────────────────────

fn read_rows(path: &PathBuf) -> Result<Vec<Row>> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading {}", path.display()))?;
  serde_json::from_str(&raw)
    .with_context(|| format!("{} is not a JSON array of rows", path.display()))
}

async fn run_import(
  store: &SqliteStore,
  primary: &PathBuf,
  secondary: &PathBuf,
  replace: bool,
) -> Result<()> {
  let primary_rows = read_rows(primary)?;
  let secondary_rows = read_rows(secondary)?;

  let output = merge(&primary_rows, &secondary_rows, Utc::now());
  println!(
    "{} rows read, {} claims reconciled, {} skipped (no identifier)",
    output.stats.total_rows, output.stats.merged, output.stats.skipped_rows
  );

  if replace {
    store.replace_claims(&output.claims).await?;
    println!("full replace: {} claims written", output.claims.len());
  } else {
    let existing = store.load_claims().await?;
    let merged = merge_with_existing(output.claims, &existing);
    let stats = store.upsert_claims(&merged).await?;
    println!("{} inserted, {} updated", stats.inserted, stats.updated);
  }
  Ok(())
}

async fn run_list(
  store: &SqliteStore,
  search: Option<String>,
  estado: Vec<String>,
  stagnant: bool,
  only_risk: bool,
) -> Result<()> {
  let claims = store.load_claims().await?;
  let now = Utc::now();

  let estados = estado
    .iter()
    .map(|label| {
      label
        .parse::<InternalState>()
        .map_err(|_| anyhow::anyhow!("not a recognized state: {label:?}"))
    })
    .collect::<Result<Vec<_>>>()?;

  let criteria = FilterCriteria {
    search_term: search.unwrap_or_default(),
    estado: estados,
    ..Default::default()
  };

  // The CLI runs with full visibility; partner scoping applies to partner
  // sessions in the serving layer.
  let admin = admin_user();
  let mut rows: Vec<&Claim> =
    cauce_core::filter::apply(&claims, &criteria, &admin);

  if stagnant {
    rows.retain(|c| risk::is_stagnant(c, now));
  }
  if only_risk {
    rows.retain(|c| risk::is_prescription_risk(c, now));
  }

  for c in &rows {
    let days = risk::days_in_state(c, now);
    let flags = format!(
      "{}{}",
      if risk::is_stagnant(c, now) { " [quieto]" } else { "" },
      if risk::is_prescription_risk(c, now) { " [prescripción]" } else { "" },
    );
    println!(
      "{:<12} {:<16} {:<30} {:>4}d  {}{}",
      c.id_softseguros, c.numero_siniestro, c.estado_interno, days,
      c.tecnico_asignado, flags
    );
  }
  println!("{} claims", rows.len());
  Ok(())
}

async fn run_show(store: &SqliteStore, id: &str) -> Result<()> {
  let Some(claim) = store.get_claim(id).await? else {
    bail!("claim not found: {id}");
  };

  println!("{} ({})", claim.id_softseguros, claim.id_interno);
  println!("  siniestro: {}  póliza: {}", claim.numero_siniestro, claim.poliza);
  println!("  asegurado: {}", claim.asegurado);
  println!(
    "  ramo: {}  aseguradora: {}  técnico: {}",
    claim.ramo, claim.aseguradora, claim.tecnico_asignado
  );
  println!(
    "  estado: {}  desde: {}",
    claim.estado_interno,
    claim.effective_last_change().format("%Y-%m-%d")
  );
  println!(
    "  reclamo: {:.0}  deducible: {:.0}  indemnización: {:.0}  neto: {:.0}",
    claim.monto_reclamo,
    claim.valor_deducible,
    claim.valor_indemnizacion,
    claim.neto_a_pagar()
  );
  if let Some(days) = risk::days_to_prescription(&claim, Utc::now()) {
    println!("  prescripción: {days} días restantes");
  }

  if !claim.state_history.is_empty() {
    println!("  historial:");
    for entry in &claim.state_history {
      println!(
        "    {} → {}  {} ({} días, {})",
        entry.start_date.format("%Y-%m-%d"),
        entry.end_date.format("%Y-%m-%d"),
        entry.state,
        entry.days_duration,
        entry.author
      );
    }
  }

  if !claim.timeline.is_empty() {
    println!("  timeline:");
    for event in &claim.timeline {
      let marker = if event.is_system { "*" } else { " " };
      println!(
        "   {marker}{} {}: {}",
        event.date.format("%Y-%m-%d %H:%M"),
        event.author,
        event.text
      );
    }
  }
  Ok(())
}

async fn run_transition(
  store: &SqliteStore,
  id: &str,
  state: &str,
  user: &str,
) -> Result<()> {
  let Some(claim) = store.get_claim(id).await? else {
    bail!("claim not found: {id}");
  };

  match engine::transition_to_label(&claim, state, user, Utc::now())? {
    Transition::Unchanged => {
      println!("{id} already in {state}; nothing to do");
    }
    Transition::Applied(outcome) => {
      store.commit_transition(&outcome).await?;
      println!(
        "{id}: {} → {} ({} días en el estado anterior)",
        outcome.history_entry.state,
        outcome.claim.estado_interno,
        outcome.history_entry.days_duration
      );
    }
  }
  Ok(())
}

async fn run_note(
  store: &SqliteStore,
  id: &str,
  text: &str,
  user: &str,
) -> Result<()> {
  let Some(claim) = store.get_claim(id).await? else {
    bail!("claim not found: {id}");
  };

  let (updated, event) = engine::add_note(&claim, user, text, Utc::now());
  store.save_claim_header(&updated).await?;
  store.append_timeline_event(id, &event).await?;
  println!("nota agregada a {id}");
  Ok(())
}

async fn run_report(store: &SqliteStore, by: Option<&str>) -> Result<()> {
  let keys: Vec<GroupKey> = match by {
    Some(label) => vec![GroupKey::from_label(label)?],
    None => GroupKey::iter().collect(),
  };

  let claims = store.load_claims().await?;
  let now = Utc::now();

  let k = risk::kpis(&claims, now);
  println!("total reclamado (abierto): {:.0}", k.total_reclamado);
  println!("tasa de éxito: {:.1}%", k.tasa_exito);
  println!("casos quietos (>30 días): {}", k.casos_quietos);

  let risks: Vec<&Claim> = claims
    .iter()
    .filter(|c| risk::is_prescription_risk(c, now))
    .collect();
  if !risks.is_empty() {
    println!("riesgo de prescripción: {} casos", risks.len());
    for c in risks {
      let days = risk::days_to_prescription(c, now).unwrap_or_default();
      println!("  {:<12} {} ({days} días)", c.id_softseguros, c.numero_siniestro);
    }
  }

  for key in keys {
    println!("\npor {key}:");
    for (value, group) in risk::group_by(&claims, key) {
      println!("  {:<30} {}", value, group.len());
    }
  }
  Ok(())
}

fn admin_user() -> cauce_core::claim::User {
  cauce_core::claim::User {
    id:        "cli".into(),
    name:      "cli".into(),
    email:     String::new(),
    role:      cauce_core::claim::Role::Admin,
    initials:  String::new(),
    aliado_id: None,
  }
}
