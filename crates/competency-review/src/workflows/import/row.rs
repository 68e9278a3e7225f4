use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::normalizer::normalize_header;

/// A single cell as handed over by the upload decoder or a JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Blank,
}

impl RawValue {
    /// Spreadsheet cell text; empty or whitespace-only cells are blank.
    pub fn from_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            Self::Blank
        } else {
            Self::Text(trimmed.to_string())
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Blank => true,
            RawValue::Text(text) => text.trim().is_empty(),
            RawValue::Number(_) => false,
        }
    }

    /// Trimmed textual form, `None` when blank. Whole numbers render without a fraction so
    /// a numeric year of `2025` reads as `"2025"`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Blank => None,
            RawValue::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            RawValue::Number(number) => Some(number.to_string()),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Blank => Ok(()),
            RawValue::Text(text) => f.write_str(text),
            RawValue::Number(number) => write!(f, "{number}"),
        }
    }
}

/// Column name to raw value, keeping the order columns were first seen.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "BTreeMap<String, RawValue>")]
pub struct RawRow {
    cells: Vec<(String, RawValue)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a cell under its normalized column name. The first value for a column wins and
    /// cells without a usable header are dropped.
    pub fn insert(&mut self, column: &str, value: RawValue) {
        let column = normalize_header(column);
        if column.is_empty() || self.get(&column).is_some() {
            return;
        }
        self.cells.push((column, value));
    }

    pub fn with(mut self, column: &str, value: RawValue) -> Self {
        self.insert(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&RawValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Trimmed text for a column, `None` when missing or blank.
    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).and_then(RawValue::as_text)
    }

    /// Present and non-blank.
    pub fn is_filled(&self, column: &str) -> bool {
        self.get(column).map(|value| !value.is_blank()).unwrap_or(false)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|(_, value)| value.is_blank())
    }
}

impl From<BTreeMap<String, RawValue>> for RawRow {
    fn from(map: BTreeMap<String, RawValue>) -> Self {
        let mut row = RawRow::new();
        for (column, value) in map {
            row.insert(&column, value);
        }
        row
    }
}

impl Serialize for RawRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (column, value) in &self.cells {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}
