//! Sheet data structures
//!
//! A sheet is an ordered list of labeled rows. Column 0 is the row label and
//! columns 1.. hold the cell text, so a row serializes to the flat wire shape
//! `["label", "cell1", "cell2", ...]`.

use serde::de::Deserializer;
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Title given to sheets that have never been saved
pub const DEFAULT_TITLE: &str = "Plano Financeiro";

/// Headers given to sheets that have never been saved
pub const DEFAULT_HEADERS: [&str; 7] = [
    "Parâmetro",
    "Inicial",
    "Ano 1",
    "Ano 2",
    "Ano 3",
    "Ano 4",
    "Ano 5",
];

/// Represents a named sheet of a financial plan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl Sheet {
    /// The structure returned for a sheet that has no persisted data yet
    pub fn empty(name: &str) -> Self {
        Self::with_layout(name, DEFAULT_TITLE, DEFAULT_HEADERS.iter().copied())
    }

    /// An empty sheet with a custom title and headers
    pub fn with_layout<'a>(
        name: &str,
        title: &str,
        headers: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            title: title.to_string(),
            subtitle: name.to_string(),
            headers: headers.into_iter().map(str::to_string).collect(),
            rows: Vec::new(),
        }
    }

    /// First row carrying `label`
    pub fn find_row(&self, label: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Position of the first row carrying `label`
    pub fn position(&self, label: &str) -> Option<usize> {
        self.rows.iter().position(|r| r.label == label)
    }

    /// Label -> row position lookup; on duplicate labels the first row wins
    pub fn label_index(&self) -> HashMap<&str, usize> {
        let mut index = HashMap::new();
        for (pos, row) in self.rows.iter().enumerate() {
            if row.label.is_empty() {
                continue;
            }
            index.entry(row.label.as_str()).or_insert(pos);
        }
        index
    }
}

/// A labeled row; `cells[i]` is column `i + 1`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub label: String,
    pub cells: Vec<Option<String>>,
}

impl Row {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            cells: Vec::new(),
        }
    }

    /// Build a row from its wire cells (label first); empty text is a missing cell
    pub fn from_wire<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut iter = cells.into_iter().map(Into::into);
        let label = iter.next().unwrap_or_default();
        Self {
            label,
            cells: iter.map(|c| if c.is_empty() { None } else { Some(c) }).collect(),
        }
    }

    /// Number of columns including the label
    pub fn len(&self) -> usize {
        self.cells.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_empty() && self.cells.iter().all(Option::is_none)
    }

    /// Text at `column`; column 0 is the label. Missing cells read as `None`.
    pub fn get(&self, column: usize) -> Option<&str> {
        if column == 0 {
            return Some(self.label.as_str());
        }
        self.cells.get(column - 1).and_then(|c| c.as_deref())
    }

    /// Write `value` at `column`, padding with empty cells as needed.
    /// Writing column 0 renames the row.
    pub fn set(&mut self, column: usize, value: impl Into<String>) {
        let value = value.into();
        if column == 0 {
            self.label = value;
            return;
        }

        let idx = column - 1;
        if self.cells.len() <= idx {
            self.cells.resize(idx + 1, None);
        }
        self.cells[idx] = if value.is_empty() { None } else { Some(value) };
    }

    /// Wire representation: label followed by every cell, missing ones as ""
    pub fn to_wire(&self) -> Vec<&str> {
        std::iter::once(self.label.as_str())
            .chain(self.cells.iter().map(|c| c.as_deref().unwrap_or("")))
            .collect()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for cell in self.to_wire() {
            seq.serialize_element(cell)?;
        }
        seq.end()
    }
}

/// Scalars accepted inside a persisted row
#[derive(Deserialize)]
#[serde(untagged)]
enum WireScalar {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl WireScalar {
    fn into_text(self) -> String {
        match self {
            WireScalar::Text(s) => s,
            WireScalar::Number(n) => n.to_string(),
            WireScalar::Bool(b) => b.to_string(),
        }
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let cells: Vec<Option<WireScalar>> = Vec::deserialize(deserializer)?;
        Ok(Row::from_wire(
            cells
                .into_iter()
                .map(|c| c.map(WireScalar::into_text).unwrap_or_default()),
        ))
    }
}
