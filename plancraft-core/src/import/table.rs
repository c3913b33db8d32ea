//! Tabular import source read with calamine

use super::ImportError;
use calamine::{Data, Range, Reader, open_workbook_auto};
use std::path::Path;

const SUPPORTED_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// A single source cell
#[derive(Debug, Clone, PartialEq)]
pub enum TableCell {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
}

impl TableCell {
    /// Empty, or text made only of whitespace
    pub fn is_blank(&self) -> bool {
        match self {
            TableCell::Empty => true,
            TableCell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Display text; whole numbers print without a fractional part
    pub fn to_text(&self) -> String {
        match self {
            TableCell::Empty => String::new(),
            TableCell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{:.0}", n),
            TableCell::Number(n) => n.to_string(),
            TableCell::Text(s) => s.clone(),
            TableCell::Boolean(b) => b.to_string(),
        }
    }
}

/// Header row plus data rows; rows may be shorter than the header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<TableCell>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<TableCell>>) -> Self {
        Self { headers, rows }
    }

    /// Cell at (`row`, `column`); out-of-range reads are empty
    pub fn cell(&self, row: usize, column: usize) -> &TableCell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&TableCell::Empty)
    }

    /// Reject sources that carry no columns or no data rows
    pub fn ensure_not_empty(&self) -> Result<(), ImportError> {
        if self.headers.is_empty() {
            return Err(ImportError::NoColumns);
        }
        if self.rows.is_empty() {
            return Err(ImportError::Empty);
        }
        Ok(())
    }
}

/// Read the first worksheet of a spreadsheet file; row 0 is the header row.
/// Fully blank rows are dropped.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Table, ImportError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ImportError::UnsupportedFormat(path.display().to_string()));
    }

    let mut workbook = open_workbook_auto(path)?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Err(ImportError::NoColumns),
    };

    let table = table_from_range(&range);
    log::debug!(
        "Read {} columns and {} rows from {}",
        table.headers.len(),
        table.rows.len(),
        path.display()
    );
    table.ensure_not_empty()?;
    Ok(table)
}

fn table_from_range(range: &Range<Data>) -> Table {
    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .enumerate()
            .map(|(i, data)| match convert_cell(data) {
                cell if cell.is_blank() => format!("Unnamed: {}", i),
                cell => cell.to_text(),
            })
            .collect(),
        None => Vec::new(),
    };

    let rows = rows
        .map(|row| row.iter().map(convert_cell).collect::<Vec<_>>())
        .filter(|row| !row.iter().all(TableCell::is_blank))
        .collect();

    Table { headers, rows }
}

fn convert_cell(data: &Data) -> TableCell {
    match data {
        Data::Int(i) => TableCell::Number(*i as f64),
        Data::Float(f) => TableCell::Number(*f),
        Data::String(s) => TableCell::Text(s.clone()),
        Data::Bool(b) => TableCell::Boolean(*b),
        Data::DateTime(dt) => TableCell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => TableCell::Text(s.clone()),
        Data::Error(_) | Data::Empty => TableCell::Empty,
    }
}
