use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display};
use std::path::Path;

use log::info;
use serde_json::{Map, Value};

use crate::netdive::NetdiveError;

/// Placeholder written for missing cells
pub const MISSING_CELL: &str = "None";

/// Column-ordered table of string cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row, padding short rows with `MISSING_CELL`
    pub fn push_row<S: Into<String>>(&mut self, cells: impl IntoIterator<Item = S>) {
        let mut row: Vec<String> = cells.into_iter().map(Into::into).collect();
        row.resize(self.columns.len(), MISSING_CELL.to_string());
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Result<usize, NetdiveError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| NetdiveError::UnknownColumn(name.to_string()))
    }

    /// Cell by row number and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column).ok()?;
        self.rows.get(row).map(|r| r[col].as_str())
    }

    /// Write as CSV with a leading unnamed index column
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), NetdiveError> {
        let path = path.as_ref();
        let mut writer = csv::Writer::from_path(path)?;

        let mut header = vec![String::new()];
        header.extend(self.columns.iter().cloned());
        writer.write_record(&header)?;

        for (i, row) in self.rows.iter().enumerate() {
            let mut record = vec![i.to_string()];
            record.extend(row.iter().cloned());
            writer.write_record(&record)?;
        }
        writer.flush()?;

        info!("Saved Output to {}", path.display());
        Ok(())
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(c, name)| {
                self.rows
                    .iter()
                    .map(|r| r[c].chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        let index_width = self.rows.len().saturating_sub(1).to_string().len();

        write!(f, "{:width$}", "", width = index_width)?;
        for (name, width) in self.columns.iter().zip(&widths) {
            write!(f, "  {:<width$}", name, width = *width)?;
        }
        writeln!(f)?;
        for (i, row) in self.rows.iter().enumerate() {
            write!(f, "{:<width$}", i, width = index_width)?;
            for (cell, width) in row.iter().zip(&widths) {
                write!(f, "  {:<width$}", cell, width = *width)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Group rows by `group_by` and gather the distinct `combine` values of each group.
///
/// Groups come out in sorted key order; each combined cell lists its values
/// sorted and joined by `", "`.
pub fn combine_rows(table: &Table, group_by: &str, combine: &str) -> Result<Table, NetdiveError> {
    let key_col = table.column_index(group_by)?;
    let value_col = table.column_index(combine)?;

    let mut groups: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for row in table.rows() {
        groups
            .entry(row[key_col].as_str())
            .or_default()
            .insert(row[value_col].as_str());
    }

    let mut combined = Table::new([group_by, combine]);
    for (key, values) in groups {
        let joined = values.into_iter().collect::<Vec<_>>().join(", ");
        combined.push_row([key.to_string(), joined]);
    }
    Ok(combined)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => MISSING_CELL.to_string(),
        other => other.to_string(),
    }
}

/// Parse a JSON array of objects
pub fn records_from_json(text: &str) -> Result<Vec<Map<String, Value>>, NetdiveError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map),
                other => Err(NetdiveError::Json(format!("expected an object, found {}", other))),
            })
            .collect(),
        _ => Err(NetdiveError::Json("expected an array of objects".to_string())),
    }
}

/// Flatten records whose `column` holds a nested object.
///
/// The nested keys become columns after the remaining top-level ones; the
/// nested column itself is dropped and absent cells read `"None"`.
pub fn expand_column(records: &[Map<String, Value>], column: &str) -> Table {
    let mut outer: Vec<String> = Vec::new();
    let mut inner: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if key != column && !outer.contains(key) {
                outer.push(key.clone());
            }
        }
        if let Some(Value::Object(nested)) = record.get(column) {
            for key in nested.keys() {
                if !inner.contains(key) {
                    inner.push(key.clone());
                }
            }
        }
    }

    let mut table = Table::new(outer.iter().chain(inner.iter()).cloned());
    for record in records {
        let nested = match record.get(column) {
            Some(Value::Object(nested)) => Some(nested),
            _ => None,
        };
        let outer_cells = outer.iter().map(|key| record.get(key));
        let inner_cells = inner.iter().map(|key| nested.and_then(|n| n.get(key)));
        table.push_row(
            outer_cells
                .chain(inner_cells)
                .map(|value| value.map_or_else(|| MISSING_CELL.to_string(), cell_text)),
        );
    }
    table
}

/// Decode a byte-keyed map into strings
pub fn decode_bytes(data: &BTreeMap<Vec<u8>, Vec<u8>>) -> Result<BTreeMap<String, String>, NetdiveError> {
    let decode = |bytes: &[u8]| {
        String::from_utf8(bytes.to_vec()).map_err(|e| NetdiveError::InvalidUtf8(e.to_string()))
    };
    data.iter()
        .map(|(key, value)| -> Result<(String, String), NetdiveError> {
            Ok((decode(key)?, decode(value)?))
        })
        .collect()
}
