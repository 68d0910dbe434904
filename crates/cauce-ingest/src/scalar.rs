//! Lenient scalar parsing for currency and date cells.
//!
//! Nothing here fails: every parse resolves to a documented fallback (zero
//! for money, the import timestamp for dates) so a malformed cell degrades
//! one value, never a whole row or import.

use chrono::{DateTime, NaiveDate, Utc};

use crate::row::Cell;

/// Days between the spreadsheet serial epoch (1899-12-30, after the off-by-
/// two lotus adjustment) and the Unix epoch.
const SERIAL_UNIX_OFFSET_DAYS: f64 = 25_569.0;

// ─── Currency ────────────────────────────────────────────────────────────────

/// Parse a monetary cell. Text is stripped of every character except digits,
/// `.` and `-` before parsing; empty or non-numeric results become 0.
///
/// The strip rule is lossy for locale thousands-separators: `"$5,000,000"`
/// parses as 5000000, but `"$1.200.000,00"` strips to a multi-dot string and
/// falls back to 0. Matches the upstream reconciler exactly.
pub fn parse_currency(cell: &Cell) -> f64 {
  match cell {
    Cell::Number(n) => *n,
    Cell::Text(s) => {
      let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
      cleaned.parse::<f64>().unwrap_or(0.0)
    }
    Cell::Bool(_) | Cell::Empty => 0.0,
  }
}

// ─── Dates ───────────────────────────────────────────────────────────────────

/// Parse a date cell, trying in order:
///
/// 1. numeric spreadsheet serial day-count (fixed epoch offset);
/// 2. RFC 3339 / ISO-8601 (`YYYY-MM-DD` accepted date-only);
/// 3. `DD/MM/YYYY`.
///
/// The first successful parse wins; everything else — including an empty
/// cell — substitutes `now` (lossy fallback, flagged in the import stats
/// producers' documentation).
pub fn parse_date(cell: &Cell, now: DateTime<Utc>) -> DateTime<Utc> {
  try_parse_date(cell).unwrap_or(now)
}

/// [`parse_date`] without the fallback; `None` when no encoding matches.
pub fn try_parse_date(cell: &Cell) -> Option<DateTime<Utc>> {
  match cell {
    Cell::Number(serial) => {
      let secs = (serial - SERIAL_UNIX_OFFSET_DAYS) * 86_400.0;
      DateTime::from_timestamp(secs as i64, 0)
    }
    Cell::Text(s) => {
      let s = s.trim();
      if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
      }
      if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
      }
      if let Ok(d) = NaiveDate::parse_from_str(s, "%d/%m/%Y") {
        return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
      }
      None
    }
    Cell::Bool(_) | Cell::Empty => None,
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
  }

  #[test]
  fn currency_plain_number() {
    assert_eq!(parse_currency(&Cell::Number(1_200_000.0)), 1_200_000.0);
    assert_eq!(parse_currency(&Cell::Text("1200000".into())), 1_200_000.0);
  }

  #[test]
  fn currency_strips_symbols_and_commas() {
    assert_eq!(parse_currency(&Cell::Text("$5,000,000".into())), 5_000_000.0);
    assert_eq!(parse_currency(&Cell::Text("COP 250.5".into())), 250.5);
    assert_eq!(parse_currency(&Cell::Text("-1,000".into())), -1_000.0);
  }

  #[test]
  fn currency_multi_dot_strings_fall_back_to_zero() {
    // The strip rule is lossy for dot thousands-separators.
    assert_eq!(parse_currency(&Cell::Text("$1.200.000,00".into())), 0.0);
  }

  #[test]
  fn currency_empty_or_junk_is_zero() {
    assert_eq!(parse_currency(&Cell::Empty), 0.0);
    assert_eq!(parse_currency(&Cell::Text("pendiente".into())), 0.0);
    assert_eq!(parse_currency(&Cell::Text("".into())), 0.0);
  }

  #[test]
  fn date_from_spreadsheet_serial() {
    // Serial 45292 is 2024-01-01.
    let parsed = parse_date(&Cell::Number(45_292.0), now());
    assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
  }

  #[test]
  fn date_from_iso_strings() {
    let parsed = parse_date(&Cell::Text("2023-05-12".into()), now());
    assert_eq!(parsed, Utc.with_ymd_and_hms(2023, 5, 12, 0, 0, 0).unwrap());

    let parsed =
      parse_date(&Cell::Text("2023-05-12T08:30:00Z".into()), now());
    assert_eq!(parsed, Utc.with_ymd_and_hms(2023, 5, 12, 8, 30, 0).unwrap());
  }

  #[test]
  fn date_from_day_month_year() {
    let parsed = parse_date(&Cell::Text("12/05/2023".into()), now());
    assert_eq!(parsed, Utc.with_ymd_and_hms(2023, 5, 12, 0, 0, 0).unwrap());
  }

  #[test]
  fn unparseable_dates_substitute_now() {
    assert_eq!(parse_date(&Cell::Text("mañana".into()), now()), now());
    assert_eq!(parse_date(&Cell::Empty, now()), now());
    assert_eq!(try_parse_date(&Cell::Text("31/31/2023".into())), None);
  }
}
