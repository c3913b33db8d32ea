//! Single-cell updates and row upsert

use crate::sheet::{Row, Sheet};
use serde::Deserialize;
use thiserror::Error;

/// Sheet targeted by an update request that names none
pub const DEFAULT_UPDATE_SHEET: &str = "pressupostos";

#[derive(Debug, Error, PartialEq)]
pub enum UpdateError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid column index: {0}")]
    InvalidColumn(i64),
}

/// Where the written cell ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// An existing row at this position was updated
    Updated(usize),
    /// A new row was appended at this position
    Inserted(usize),
}

/// Write `value` into the first row labeled `label`, creating the row at the
/// end of the sheet when no such row exists. Rows grow with empty cells up to
/// `column`.
pub fn upsert(sheet: &mut Sheet, label: &str, column: usize, value: &str) -> Upsert {
    match sheet.position(label) {
        Some(pos) => {
            sheet.rows[pos].set(column, value);
            Upsert::Updated(pos)
        }
        None => {
            let mut row = Row::new(label);
            row.set(column, value);
            sheet.rows.push(row);
            Upsert::Inserted(sheet.rows.len() - 1)
        }
    }
}

/// A validated cell update
#[derive(Debug, Clone, PartialEq)]
pub struct CellUpdate {
    pub sheet: String,
    pub row_name: String,
    pub column_index: usize,
    pub value: String,
}

impl CellUpdate {
    pub fn apply(&self, sheet: &mut Sheet) -> Upsert {
        upsert(sheet, &self.row_name, self.column_index, &self.value)
    }
}

/// Update request as received from a client; every field is optional until
/// [`CellUpdateRequest::validate`] runs
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CellUpdateRequest {
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default)]
    pub row_name: Option<String>,
    #[serde(default)]
    pub column_index: Option<i64>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

impl CellUpdateRequest {
    /// Check presence of row name, column index and value.
    /// Values may be sent as JSON strings or numbers.
    pub fn validate(self) -> Result<CellUpdate, UpdateError> {
        let row_name = self
            .row_name
            .filter(|name| !name.is_empty())
            .ok_or(UpdateError::MissingField("row_name"))?;

        let column_index = self
            .column_index
            .ok_or(UpdateError::MissingField("column_index"))?;
        let column_index =
            usize::try_from(column_index).map_err(|_| UpdateError::InvalidColumn(column_index))?;

        let value = match self.value {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            Some(serde_json::Value::Bool(b)) => b.to_string(),
            _ => return Err(UpdateError::MissingField("value")),
        };

        let sheet = self
            .sheet
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_UPDATE_SHEET.to_string());

        Ok(CellUpdate {
            sheet,
            row_name,
            column_index,
            value,
        })
    }
}
