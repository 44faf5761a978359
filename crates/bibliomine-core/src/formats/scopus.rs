//! Scopus CSV export loader.

use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::models::{RawRecord, SourceDb};

use super::{cell, join_keywords, parse_cited_by, HeaderIndex};

/// Load a Scopus CSV export and map it onto the canonical raw schema.
///
/// `EID` and `Title` are structural; every other column degrades to an
/// absent field when missing. Author and index keywords are joined into one
/// list.
pub fn load_scopus_file(path: &Path) -> Result<Vec<RawRecord>> {
    if !path.exists() {
        return Err(PipelineError::InputNotFound(path.to_path_buf()));
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if extension != "csv" {
        return Err(PipelineError::UnsupportedFormat(format!(
            "scopus export must be CSV, got .{extension}"
        )));
    }

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = HeaderIndex::new(reader.headers()?);

    let id_col = headers.required("scopus", "EID")?;
    let title_col = headers.required("scopus", "Title")?;
    let year_col = headers.optional("Year");
    let doi_col = headers.optional("DOI");
    let authors_col = headers.optional("Authors");
    let affiliations_col = headers.optional("Affiliations");
    let abstract_col = headers.optional("Abstract");
    let author_kw_col = headers.optional("Author Keywords");
    let index_kw_col = headers.optional("Index Keywords");
    let references_col = headers.optional("References");
    let cited_by_col = headers.optional("Cited by");

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let raw_record_id =
            cell(&record, Some(id_col)).unwrap_or_else(|| format!("scopus-row-{row}"));

        let mut raw = RawRecord::new(SourceDb::Scopus, raw_record_id);
        raw.title_raw = cell(&record, Some(title_col));
        raw.year_raw = cell(&record, year_col);
        raw.doi_raw = cell(&record, doi_col);
        raw.authors_raw = cell(&record, authors_col);
        raw.affiliations_raw = cell(&record, affiliations_col);
        raw.abstract_raw = cell(&record, abstract_col);
        raw.keywords_raw =
            join_keywords(cell(&record, author_kw_col), cell(&record, index_kw_col));
        raw.references_raw = cell(&record, references_col);
        raw.cited_by_raw = parse_cited_by(cell(&record, cited_by_col));
        records.push(raw);
    }

    tracing::info!(path = %path.display(), records = records.len(), "loaded scopus export");
    Ok(records)
}
