//! Web of Science export loader.
//!
//! WoS exports come as tab-delimited `.txt` or as `.csv`; the delimiter is
//! chosen by extension.

use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::models::{RawRecord, SourceDb};

use super::{cell, join_keywords, parse_cited_by, HeaderIndex};

pub fn load_wos_file(path: &Path) -> Result<Vec<RawRecord>> {
    if !path.exists() {
        return Err(PipelineError::InputNotFound(path.to_path_buf()));
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let delimiter = match extension.as_str() {
        "txt" => b'\t',
        "csv" => b',',
        other => {
            return Err(PipelineError::UnsupportedFormat(format!(
                "wos export must be tab-delimited TXT or CSV, got .{other}"
            )))
        }
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)?;
    let headers = HeaderIndex::new(reader.headers()?);

    let id_col = headers.required("wos", "UT (Unique WOS ID)")?;
    let title_col = headers.required("wos", "Article Title")?;
    let year_col = headers.optional("Publication Year");
    let doi_col = headers.optional("DOI");
    let authors_col = headers.optional("Authors");
    let affiliations_col = headers.optional("Affiliations");
    let abstract_col = headers.optional("Abstract");
    let author_kw_col = headers.optional("Author Keywords");
    let keywords_plus_col = headers.optional("Keywords Plus");
    let references_col = headers.optional("Cited References");
    let cited_by_col = headers.optional("Times Cited, WoS Core");

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let raw_record_id =
            cell(&record, Some(id_col)).unwrap_or_else(|| format!("wos-row-{row}"));

        let mut raw = RawRecord::new(SourceDb::Wos, raw_record_id);
        raw.title_raw = cell(&record, Some(title_col));
        raw.year_raw = cell(&record, year_col);
        raw.doi_raw = cell(&record, doi_col);
        raw.authors_raw = cell(&record, authors_col);
        raw.affiliations_raw = cell(&record, affiliations_col);
        raw.abstract_raw = cell(&record, abstract_col);
        raw.keywords_raw = join_keywords(
            cell(&record, author_kw_col),
            cell(&record, keywords_plus_col),
        );
        raw.references_raw = cell(&record, references_col);
        raw.cited_by_raw = parse_cited_by(cell(&record, cited_by_col));
        records.push(raw);
    }

    tracing::info!(path = %path.display(), records = records.len(), "loaded wos export");
    Ok(records)
}
