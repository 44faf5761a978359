//! Export-file loaders, one module per source database.
//!
//! Loaders map vendor column names onto [`RawRecord`] and degrade missing or
//! empty cells to absent fields. Only the record-id and title columns are
//! structural: their absence means the export schema changed and is an error.

pub mod scopus;
pub mod wos;

pub use scopus::load_scopus_file;
pub use wos::load_wos_file;

use std::collections::HashMap;

use crate::error::{PipelineError, Result};

pub(crate) struct HeaderIndex {
    by_name: HashMap<String, usize>,
}

impl HeaderIndex {
    pub(crate) fn new(headers: &csv::StringRecord) -> Self {
        let by_name = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim().to_string(), idx))
            .collect();
        Self { by_name }
    }

    pub(crate) fn optional(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub(crate) fn required(&self, source_db: &str, name: &str) -> Result<usize> {
        self.optional(name).ok_or_else(|| PipelineError::MissingColumn {
            source_db: source_db.to_string(),
            column: name.to_string(),
        })
    }
}

/// Read one cell; empty, whitespace-only and literal `nan` cells are absent.
pub(crate) fn cell(record: &csv::StringRecord, idx: Option<usize>) -> Option<String> {
    let value = record.get(idx?)?.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return None;
    }
    Some(value.to_string())
}

/// Join the two keyword columns each vendor exports into one `"; "` list.
pub(crate) fn join_keywords(first: Option<String>, second: Option<String>) -> Option<String> {
    match (first, second) {
        (Some(a), Some(b)) => Some(format!("{a}; {b}")),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// Parse a citation count; non-numeric cells count as zero.
pub(crate) fn parse_cited_by(value: Option<String>) -> u64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| *v >= 0.0)
        .map(|v| v as u64)
        .unwrap_or(0)
}
