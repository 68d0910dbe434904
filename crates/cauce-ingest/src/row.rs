//! Raw tabular input: one row is a mapping from column name to cell value.
//!
//! Column-name lookups are exact (case- and format-sensitive); unrecognized
//! columns are simply ignored by the merge.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A raw cell as it comes out of a spreadsheet export. Deserializes straight
/// from a JSON extract: numbers stay numbers (spreadsheet serial dates
/// included), `null` is [`Cell::Empty`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
  Bool(bool),
  Number(f64),
  Text(String),
  Empty,
}

impl Cell {
  /// The cell rendered as text, `None` when empty or blank.
  /// Numbers keep integer formatting when they carry no fraction.
  pub fn as_text(&self) -> Option<String> {
    match self {
      Cell::Text(s) => {
        let trimmed = s.trim();
        if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
      }
      Cell::Number(n) => {
        if n.fract() == 0.0 {
          Some(format!("{}", *n as i64))
        } else {
          Some(n.to_string())
        }
      }
      Cell::Bool(b) => Some(b.to_string()),
      Cell::Empty => None,
    }
  }

  pub fn is_empty(&self) -> bool {
    match self {
      Cell::Empty => true,
      Cell::Text(s) => s.trim().is_empty(),
      _ => false,
    }
  }
}

/// One extract row.
pub type Row = BTreeMap<String, Cell>;

/// The first non-blank text value among `columns`, or the empty string.
/// Absent and blank cells are treated alike (lenient parsing policy).
pub fn text_of(row: &Row, columns: &[&str]) -> String {
  columns
    .iter()
    .find_map(|c| row.get(*c).and_then(Cell::as_text))
    .unwrap_or_default()
}

/// The raw cell under the first matching column, if any.
pub fn cell_of<'a>(row: &'a Row, columns: &[&str]) -> Option<&'a Cell> {
  columns.iter().find_map(|c| row.get(*c))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cells_deserialize_untagged_from_json() {
    let row: Row = serde_json::from_str(
      r#"{"IDENTIFICADOR": "SOFT-1", "MONTO RECLAMO": 1200000,
          "FECHA DEL SINIESTRO": 45100.5, "VACIA": null}"#,
    )
    .unwrap();

    assert_eq!(row["IDENTIFICADOR"], Cell::Text("SOFT-1".into()));
    assert_eq!(row["MONTO RECLAMO"], Cell::Number(1_200_000.0));
    assert_eq!(row["VACIA"], Cell::Empty);
  }

  #[test]
  fn numeric_cells_render_without_spurious_fraction() {
    assert_eq!(Cell::Number(882.0).as_text().unwrap(), "882");
    assert_eq!(Cell::Number(0.5).as_text().unwrap(), "0.5");
  }

  #[test]
  fn text_of_falls_through_blank_columns() {
    let row: Row = serde_json::from_str(
      r#"{"SUBRAMO": "  ", "RAMO": "Automóviles"}"#,
    )
    .unwrap();
    assert_eq!(text_of(&row, &["SUBRAMO", "RAMO"]), "Automóviles");
    assert_eq!(text_of(&row, &["NO EXISTE"]), "");
  }
}
