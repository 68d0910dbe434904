//! SQL schema for the Cauce SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS claims (
    id_softseguros          TEXT PRIMARY KEY,
    id_interno              TEXT NOT NULL,
    numero_siniestro        TEXT NOT NULL DEFAULT '',
    poliza                  TEXT NOT NULL DEFAULT '',
    asegurado               TEXT NOT NULL DEFAULT '',
    estado_softseguros      TEXT NOT NULL DEFAULT '',
    usuario_registro        TEXT NOT NULL DEFAULT '',
    ultimo_seguimiento_raw  TEXT NOT NULL DEFAULT '',
    placa_bien              TEXT NOT NULL DEFAULT '',
    ramo                    TEXT NOT NULL DEFAULT '',
    aseguradora             TEXT NOT NULL DEFAULT '',
    vendedor                TEXT NOT NULL DEFAULT '',
    tecnico_asignado        TEXT NOT NULL DEFAULT '',
    aliado_origen           TEXT NOT NULL DEFAULT '',
    estado_interno          TEXT NOT NULL,   -- catalog state label
    last_state_change       TEXT,            -- RFC 3339; NULL on legacy rows
    prioridad               TEXT NOT NULL DEFAULT 'Media',
    monto_reclamo           REAL NOT NULL DEFAULT 0,
    valor_deducible         REAL NOT NULL DEFAULT 0,
    valor_indemnizacion     REAL NOT NULL DEFAULT 0,
    fecha_ocurrencia        TEXT,            -- RFC 3339 or NULL
    updated_at              TEXT NOT NULL    -- RFC 3339
);

-- Closed dwell periods are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table outside a
-- full-replace import. The UNIQUE constraint makes a retried transition
-- commit insert its history row exactly once.
CREATE TABLE IF NOT EXISTS state_history (
    claim_id      TEXT NOT NULL REFERENCES claims(id_softseguros),
    state         TEXT NOT NULL,
    start_date    TEXT NOT NULL,
    end_date      TEXT NOT NULL,
    days_duration INTEGER NOT NULL,
    author        TEXT NOT NULL,
    UNIQUE (claim_id, state, start_date)
);

-- Timeline events are append-only; the event id makes retries idempotent.
CREATE TABLE IF NOT EXISTS timeline (
    event_id  TEXT PRIMARY KEY,
    claim_id  TEXT NOT NULL REFERENCES claims(id_softseguros),
    date      TEXT NOT NULL,
    author    TEXT NOT NULL,
    text      TEXT NOT NULL,
    is_system INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS history_claim_idx  ON state_history(claim_id);
CREATE INDEX IF NOT EXISTS timeline_claim_idx ON timeline(claim_id);
CREATE INDEX IF NOT EXISTS claims_state_idx   ON claims(estado_interno);

PRAGMA user_version = 1;
";
