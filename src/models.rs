//! Data models for collected articles.
//!
//! - [`ArticleRecord`]: one search-result row as returned by a source API
//!
//! Sources return loosely-typed JSON objects whose keys differ between GDELT
//! and NewsAPI, so a record keeps whatever columns the API supplied instead of
//! mapping them onto a fixed struct. Every cell is stored as text; a missing
//! or null cell is simply absent from the record.

use serde_json::{Map, Value};

/// A single article row with its columns in arrival order.
///
/// Columns are unique within a record. Lookups are linear, which is fine for
/// the dozen or so fields a news API returns per article.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleRecord {
    cells: Vec<(String, String)>,
}

impl ArticleRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from one element of a source's `articles` array.
    ///
    /// Strings are kept verbatim, numbers and booleans are rendered as text,
    /// nested objects and arrays (NewsAPI's `source: {id, name}` for example)
    /// are rendered as compact JSON. `null` and empty strings become absent
    /// cells so they survive a CSV round-trip unchanged.
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        let mut record = Self::new();
        for (column, value) in object {
            let text = match value {
                Value::Null => continue,
                Value::String(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Array(_) | Value::Object(_) => value.to_string(),
            };
            record.insert(column.clone(), text);
        }
        record
    }

    /// Set `column` to `value`, replacing any earlier value for that column.
    /// Empty values are treated as missing and clear the cell.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        let existing = self.cells.iter().position(|(c, _)| *c == column);
        match (existing, value.is_empty()) {
            (Some(i), true) => {
                self.cells.remove(i);
            }
            (Some(i), false) => self.cells[i].1 = value,
            (None, true) => {}
            (None, false) => self.cells.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn has(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// Column names present in this record, in arrival order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(c, _)| c.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Convenience for tests and callers building records by hand.
impl<K, V> FromIterator<(K, V)> for ArticleRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}
