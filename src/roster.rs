//! Roster import: turns an uploaded table into canonical `RosterEntry` values.
//!
//! Validation order matters. Every row must carry a non-blank name and id or
//! the whole import fails at that row; the blank filter afterwards only runs
//! over rows that already passed.

use crate::error::ImportError;
use crate::model::RosterEntry;
use crate::normalize::{
    classify_header, headers_cover_token, parse_csv_records, ColumnKind,
};
use serde::{Deserialize, Serialize};

const REQUIRED_TOKENS: [&str; 2] = ["name", "id"];

/// Header-plus-rows table. Rows may be shorter than `headers`; missing cells
/// are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }
}

#[derive(Debug)]
struct NormalizedRow {
    name: String,
    id: String,
}

pub fn import(table: &RawTable) -> Result<Vec<RosterEntry>, ImportError> {
    // The header set belongs to the first data row; no rows means no headers.
    if table.rows.is_empty()
        || !REQUIRED_TOKENS
            .iter()
            .all(|token| headers_cover_token(&table.headers, token))
    {
        return Err(ImportError::MissingColumns);
    }

    let kinds: Vec<ColumnKind> = table.headers.iter().map(|h| classify_header(h)).collect();

    let mut normalized = Vec::with_capacity(table.rows.len());
    for (idx, row) in table.rows.iter().enumerate() {
        let name = first_cell(&kinds, row, ColumnKind::Name);
        let id = first_cell(&kinds, row, ColumnKind::Id);
        match (name, id) {
            (Some(name), Some(id)) if !name.is_empty() && !id.is_empty() => {
                normalized.push(NormalizedRow { name, id })
            }
            _ => return Err(ImportError::InvalidRow(idx + 1)),
        }
    }

    let entries: Vec<RosterEntry> = normalized
        .into_iter()
        .filter(|r| !r.name.is_empty() && !r.id.is_empty())
        .map(|r| RosterEntry {
            id: r.id,
            name: r.name,
        })
        .collect();

    if entries.is_empty() {
        return Err(ImportError::EmptyRoster);
    }
    Ok(entries)
}

fn first_cell(kinds: &[ColumnKind], row: &[String], want: ColumnKind) -> Option<String> {
    kinds
        .iter()
        .enumerate()
        .filter(|(_, k)| **k == want)
        .find_map(|(i, _)| row.get(i))
        .map(|v| v.trim().to_string())
}

pub fn parse_csv(text: &str) -> Result<RawTable, ImportError> {
    let mut records = parse_csv_records(text)
        .map_err(|e| ImportError::ParseFailure(e.message))?
        .into_iter();
    let Some(headers) = records.next() else {
        return Ok(RawTable::default());
    };

    let mut rows = Vec::new();
    for (idx, record) in records.enumerate() {
        if record.len() < headers.len() {
            return Err(ImportError::ParseFailure(format!(
                "Too few fields: expected {} fields but parsed {} (row {})",
                headers.len(),
                record.len(),
                idx + 1
            )));
        }
        if record.len() > headers.len() {
            return Err(ImportError::ParseFailure(format!(
                "Too many fields: expected {} fields but parsed {} (row {})",
                headers.len(),
                record.len(),
                idx + 1
            )));
        }
        rows.push(record);
    }
    Ok(RawTable { headers, rows })
}

pub fn import_csv(text: &str) -> Result<Vec<RosterEntry>, ImportError> {
    import(&parse_csv(text)?)
}
