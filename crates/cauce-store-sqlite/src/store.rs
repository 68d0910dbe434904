//! [`SqliteStore`] — the SQLite implementation of [`ClaimStore`].

use std::{collections::HashMap, path::Path};

use rusqlite::OptionalExtension as _;
use tracing::debug;

use cauce_core::{
  claim::{Claim, StateHistoryEntry, TimelineEvent},
  engine::TransitionOutcome,
  store::{ClaimStore, ImportStats},
};

use crate::{
  Error, Result,
  encode::{
    RawClaim, RawHistoryEntry, RawTimelineEvent, encode_dt, encode_priority,
    encode_state, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Cauce claim store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row-level helpers (run inside `conn.call` closures) ─────────────────────

const CLAIM_COLUMNS: &str = "id_softseguros, id_interno, numero_siniestro, \
   poliza, asegurado, estado_softseguros, usuario_registro, \
   ultimo_seguimiento_raw, placa_bien, ramo, aseguradora, vendedor, \
   tecnico_asignado, aliado_origen, estado_interno, last_state_change, \
   prioridad, monto_reclamo, valor_deducible, valor_indemnizacion, \
   fecha_ocurrencia, updated_at";

fn claim_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawClaim> {
  Ok(RawClaim {
    id_softseguros:         row.get(0)?,
    id_interno:             row.get(1)?,
    numero_siniestro:       row.get(2)?,
    poliza:                 row.get(3)?,
    asegurado:              row.get(4)?,
    estado_softseguros:     row.get(5)?,
    usuario_registro:       row.get(6)?,
    ultimo_seguimiento_raw: row.get(7)?,
    placa_bien:             row.get(8)?,
    ramo:                   row.get(9)?,
    aseguradora:            row.get(10)?,
    vendedor:               row.get(11)?,
    tecnico_asignado:       row.get(12)?,
    aliado_origen:          row.get(13)?,
    estado_interno:         row.get(14)?,
    last_state_change:      row.get(15)?,
    prioridad:              row.get(16)?,
    monto_reclamo:          row.get(17)?,
    valor_deducible:        row.get(18)?,
    valor_indemnizacion:    row.get(19)?,
    fecha_ocurrencia:       row.get(20)?,
    updated_at:             row.get(21)?,
  })
}

/// Upsert every scalar column of a claim header. Nested rows are untouched.
fn write_header(conn: &rusqlite::Connection, c: &Claim) -> rusqlite::Result<()> {
  conn.execute(
    &format!(
      "INSERT INTO claims ({CLAIM_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
               ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)
       ON CONFLICT (id_softseguros) DO UPDATE SET
         id_interno = ?2, numero_siniestro = ?3, poliza = ?4, asegurado = ?5,
         estado_softseguros = ?6, usuario_registro = ?7,
         ultimo_seguimiento_raw = ?8, placa_bien = ?9, ramo = ?10,
         aseguradora = ?11, vendedor = ?12, tecnico_asignado = ?13,
         aliado_origen = ?14, estado_interno = ?15, last_state_change = ?16,
         prioridad = ?17, monto_reclamo = ?18, valor_deducible = ?19,
         valor_indemnizacion = ?20, fecha_ocurrencia = ?21, updated_at = ?22"
    ),
    rusqlite::params![
      c.id_softseguros,
      c.id_interno,
      c.numero_siniestro,
      c.poliza,
      c.asegurado,
      c.estado_softseguros,
      c.usuario_registro,
      c.ultimo_seguimiento_raw,
      c.placa_bien,
      c.ramo,
      c.aseguradora,
      c.vendedor,
      c.tecnico_asignado,
      c.aliado_origen,
      encode_state(c.estado_interno),
      c.last_state_change.map(encode_dt),
      encode_priority(c.prioridad),
      c.monto_reclamo,
      c.valor_deducible,
      c.valor_indemnizacion,
      c.fecha_ocurrencia.map(encode_dt),
      encode_dt(c.updated_at),
    ],
  )?;
  Ok(())
}

/// Append one history row; the UNIQUE constraint absorbs retries.
fn write_history_entry(
  conn: &rusqlite::Connection,
  claim_id: &str,
  entry: &StateHistoryEntry,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT OR IGNORE INTO state_history
       (claim_id, state, start_date, end_date, days_duration, author)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![
      claim_id,
      encode_state(entry.state),
      encode_dt(entry.start_date),
      encode_dt(entry.end_date),
      entry.days_duration,
      entry.author,
    ],
  )?;
  Ok(())
}

/// Append one timeline row; the event-id primary key absorbs retries.
fn write_timeline_event(
  conn: &rusqlite::Connection,
  claim_id: &str,
  event: &TimelineEvent,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT OR IGNORE INTO timeline
       (event_id, claim_id, date, author, text, is_system)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![
      encode_uuid(event.event_id),
      claim_id,
      encode_dt(event.date),
      event.author,
      event.text,
      event.is_system,
    ],
  )?;
  Ok(())
}

fn read_history_rows(
  conn: &rusqlite::Connection,
  claim_id: Option<&str>,
) -> rusqlite::Result<Vec<RawHistoryEntry>> {
  let map = |row: &rusqlite::Row<'_>| {
    Ok(RawHistoryEntry {
      claim_id:      row.get(0)?,
      state:         row.get(1)?,
      start_date:    row.get(2)?,
      end_date:      row.get(3)?,
      days_duration: row.get(4)?,
      author:        row.get(5)?,
    })
  };
  // History reads chronologically: oldest dwell first.
  match claim_id {
    Some(id) => {
      let mut stmt = conn.prepare(
        "SELECT claim_id, state, start_date, end_date, days_duration, author
         FROM state_history WHERE claim_id = ?1 ORDER BY start_date",
      )?;
      let rows = stmt.query_map(rusqlite::params![id], map)?;
      rows.collect()
    }
    None => {
      let mut stmt = conn.prepare(
        "SELECT claim_id, state, start_date, end_date, days_duration, author
         FROM state_history ORDER BY claim_id, start_date",
      )?;
      let rows = stmt.query_map([], map)?;
      rows.collect()
    }
  }
}

fn read_timeline_rows(
  conn: &rusqlite::Connection,
  claim_id: Option<&str>,
) -> rusqlite::Result<Vec<RawTimelineEvent>> {
  let map = |row: &rusqlite::Row<'_>| {
    Ok(RawTimelineEvent {
      event_id:  row.get(0)?,
      claim_id:  row.get(1)?,
      date:      row.get(2)?,
      author:    row.get(3)?,
      text:      row.get(4)?,
      is_system: row.get(5)?,
    })
  };
  // Timeline reads newest first.
  match claim_id {
    Some(id) => {
      let mut stmt = conn.prepare(
        "SELECT event_id, claim_id, date, author, text, is_system
         FROM timeline WHERE claim_id = ?1 ORDER BY date DESC",
      )?;
      let rows = stmt.query_map(rusqlite::params![id], map)?;
      rows.collect()
    }
    None => {
      let mut stmt = conn.prepare(
        "SELECT event_id, claim_id, date, author, text, is_system
         FROM timeline ORDER BY date DESC",
      )?;
      let rows = stmt.query_map([], map)?;
      rows.collect()
    }
  }
}

/// Insert a full claim record, nested rows included. Used by the import
/// write paths, where the record is new or the table was just cleared.
fn write_full_claim(
  conn: &rusqlite::Connection,
  claim: &Claim,
) -> rusqlite::Result<()> {
  write_header(conn, claim)?;
  for entry in &claim.state_history {
    write_history_entry(conn, &claim.id_softseguros, entry)?;
  }
  for event in &claim.timeline {
    write_timeline_event(conn, &claim.id_softseguros, event)?;
  }
  Ok(())
}

// ─── ClaimStore impl ─────────────────────────────────────────────────────────

impl ClaimStore for SqliteStore {
  type Error = Error;

  async fn load_claims(&self) -> Result<Vec<Claim>> {
    let (raw_claims, raw_history, raw_events) = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CLAIM_COLUMNS} FROM claims ORDER BY id_softseguros"
        ))?;
        let claims = stmt
          .query_map([], claim_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        let history = read_history_rows(conn, None)?;
        let events = read_timeline_rows(conn, None)?;
        Ok((claims, history, events))
      })
      .await?;

    let mut history_by: HashMap<String, Vec<StateHistoryEntry>> =
      HashMap::new();
    for raw in raw_history {
      let claim_id = raw.claim_id.clone();
      history_by.entry(claim_id).or_default().push(raw.into_entry()?);
    }

    let mut events_by: HashMap<String, Vec<TimelineEvent>> = HashMap::new();
    for raw in raw_events {
      let claim_id = raw.claim_id.clone();
      events_by.entry(claim_id).or_default().push(raw.into_event()?);
    }

    raw_claims
      .into_iter()
      .map(|raw| {
        let id = raw.id_softseguros.clone();
        raw.into_claim(
          history_by.remove(&id).unwrap_or_default(),
          events_by.remove(&id).unwrap_or_default(),
        )
      })
      .collect()
  }

  async fn get_claim(&self, id: &str) -> Result<Option<Claim>> {
    let id_owned = id.to_owned();
    let found = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!(
              "SELECT {CLAIM_COLUMNS} FROM claims WHERE id_softseguros = ?1"
            ),
            rusqlite::params![id_owned],
            claim_from_row,
          )
          .optional()?;

        match raw {
          None => Ok(None),
          Some(raw) => {
            let history = read_history_rows(conn, Some(&raw.id_softseguros))?;
            let events = read_timeline_rows(conn, Some(&raw.id_softseguros))?;
            Ok(Some((raw, history, events)))
          }
        }
      })
      .await?;

    match found {
      None => Ok(None),
      Some((raw, history, events)) => {
        let history = history
          .into_iter()
          .map(RawHistoryEntry::into_entry)
          .collect::<Result<Vec<_>>>()?;
        let events = events
          .into_iter()
          .map(RawTimelineEvent::into_event)
          .collect::<Result<Vec<_>>>()?;
        Ok(Some(raw.into_claim(history, events)?))
      }
    }
  }

  async fn save_claim_header(&self, claim: &Claim) -> Result<()> {
    let claim = claim.clone();
    self
      .conn
      .call(move |conn| {
        write_header(conn, &claim)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn append_history_entry(
    &self,
    claim_id: &str,
    entry: &StateHistoryEntry,
  ) -> Result<()> {
    let claim_id = claim_id.to_owned();
    let entry = entry.clone();
    self
      .conn
      .call(move |conn| {
        write_history_entry(conn, &claim_id, &entry)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn append_timeline_event(
    &self,
    claim_id: &str,
    event: &TimelineEvent,
  ) -> Result<()> {
    let claim_id = claim_id.to_owned();
    let event = event.clone();
    self
      .conn
      .call(move |conn| {
        write_timeline_event(conn, &claim_id, &event)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn commit_transition(&self, outcome: &TransitionOutcome) -> Result<()> {
    let claim = outcome.claim.clone();
    let entry = outcome.history_entry.clone();
    let event = outcome.timeline_event.clone();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        write_header(&tx, &claim)?;
        write_history_entry(&tx, &claim.id_softseguros, &entry)?;
        write_timeline_event(&tx, &claim.id_softseguros, &event)?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    debug!(
      claim = %outcome.claim.id_softseguros,
      state = %outcome.claim.estado_interno,
      "committed transition"
    );
    Ok(())
  }

  async fn upsert_claims(&self, claims: &[Claim]) -> Result<ImportStats> {
    let claims = claims.to_vec();
    let stats = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut stats = ImportStats::default();

        for claim in &claims {
          let exists: bool = tx
            .query_row(
              "SELECT 1 FROM claims WHERE id_softseguros = ?1",
              rusqlite::params![claim.id_softseguros],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);

          if exists {
            // Workflow columns stay with the stored record: a re-import
            // never erases state, history, timeline or priority.
            tx.execute(
              "UPDATE claims SET
                 id_interno = ?2, numero_siniestro = ?3, poliza = ?4,
                 asegurado = ?5, estado_softseguros = ?6,
                 usuario_registro = ?7, ultimo_seguimiento_raw = ?8,
                 placa_bien = ?9, ramo = ?10, aseguradora = ?11,
                 vendedor = ?12, tecnico_asignado = ?13, aliado_origen = ?14,
                 monto_reclamo = ?15, valor_deducible = ?16,
                 valor_indemnizacion = ?17, fecha_ocurrencia = ?18,
                 updated_at = ?19
               WHERE id_softseguros = ?1",
              rusqlite::params![
                claim.id_softseguros,
                claim.id_interno,
                claim.numero_siniestro,
                claim.poliza,
                claim.asegurado,
                claim.estado_softseguros,
                claim.usuario_registro,
                claim.ultimo_seguimiento_raw,
                claim.placa_bien,
                claim.ramo,
                claim.aseguradora,
                claim.vendedor,
                claim.tecnico_asignado,
                claim.aliado_origen,
                claim.monto_reclamo,
                claim.valor_deducible,
                claim.valor_indemnizacion,
                claim.fecha_ocurrencia.map(encode_dt),
                encode_dt(claim.updated_at),
              ],
            )?;
            stats.updated += 1;
          } else {
            write_full_claim(&tx, claim)?;
            stats.inserted += 1;
          }
        }

        tx.commit()?;
        Ok(stats)
      })
      .await?;

    debug!(
      inserted = stats.inserted,
      updated = stats.updated,
      "upserted import"
    );
    Ok(stats)
  }

  async fn replace_claims(&self, claims: &[Claim]) -> Result<()> {
    let count = claims.len();
    let claims = claims.to_vec();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM timeline", [])?;
        tx.execute("DELETE FROM state_history", [])?;
        tx.execute("DELETE FROM claims", [])?;
        for claim in &claims {
          write_full_claim(&tx, claim)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    debug!(count, "replaced claim set");
    Ok(())
  }
}
