//! Canonical dataset export.
//!
//! All CSV outputs are UTF-8 with a byte-order mark so they open cleanly in
//! spreadsheet tools that sniff the encoding.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::models::CanonicalRecord;
use crate::tagging::TagResult;
use crate::Result;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Open `path` for writing, emit the BOM, and wrap it in a CSV writer.
/// Parent directories are created as needed.
pub(crate) fn csv_writer_with_bom(path: &Path) -> Result<csv::Writer<File>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(UTF8_BOM)?;
    Ok(csv::Writer::from_writer(file))
}

const CANONICAL_HEADER: &[&str] = &[
    "canonical_id",
    "source_db",
    "raw_record_id",
    "title_raw",
    "year_raw",
    "doi_raw",
    "authors_raw",
    "affiliations_raw",
    "abstract_raw",
    "keywords_raw",
    "references_raw",
    "cited_by_raw",
    "doi_clean",
    "title_norm",
    "year_clean",
    "completeness_score",
    "has_scopus",
    "has_wos",
];

/// Write the canonical dataset. When tagging ran, `tags` is a slice parallel
/// to `records` and two extra columns are appended.
pub fn write_canonical_csv(
    path: &Path,
    records: &[CanonicalRecord],
    tags: Option<&[TagResult]>,
) -> Result<()> {
    let mut writer = csv_writer_with_bom(path)?;

    let mut header: Vec<&str> = CANONICAL_HEADER.to_vec();
    if tags.is_some() {
        header.push("topic_labels");
        header.push("topic_count");
    }
    writer.write_record(&header)?;

    for (idx, canonical) in records.iter().enumerate() {
        let record = &canonical.record;
        let raw = &record.raw;

        let mut row: Vec<String> = vec![
            canonical.canonical_id.clone(),
            raw.source_db.to_string(),
            raw.raw_record_id.clone(),
            raw.title_raw.clone().unwrap_or_default(),
            raw.year_raw.clone().unwrap_or_default(),
            raw.doi_raw.clone().unwrap_or_default(),
            raw.authors_raw.clone().unwrap_or_default(),
            raw.affiliations_raw.clone().unwrap_or_default(),
            raw.abstract_raw.clone().unwrap_or_default(),
            raw.keywords_raw.clone().unwrap_or_default(),
            raw.references_raw.clone().unwrap_or_default(),
            raw.cited_by_raw.to_string(),
            record.doi_clean.clone().unwrap_or_default(),
            record.title_norm.clone(),
            record
                .year_clean
                .map(|y| y.to_string())
                .unwrap_or_default(),
            record.completeness_score.to_string(),
            canonical.has_scopus.to_string(),
            canonical.has_wos.to_string(),
        ];

        if let Some(tags) = tags {
            let tag = &tags[idx];
            row.push(tag.labels.join("; "));
            row.push(tag.labels.len().to_string());
        }

        writer.write_record(&row)?;
    }

    writer.flush()?;
    tracing::info!(path = %path.display(), records = records.len(), "wrote canonical dataset");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::clean_record;
    use crate::models::{RawRecord, SourceDb};

    fn canonical(id: &str, title: &str) -> CanonicalRecord {
        let mut raw = RawRecord::new(SourceDb::Scopus, id);
        raw.title_raw = Some(title.to_string());
        CanonicalRecord {
            record: clean_record(raw),
            canonical_id: "FI_000000".to_string(),
            has_scopus: true,
            has_wos: false,
        }
    }

    #[test]
    fn canonical_csv_starts_with_bom_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canonical.csv");
        write_canonical_csv(&path, &[canonical("s1", "A Title")], None).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("\u{feff}canonical_id,source_db"));
        assert!(text.contains("FI_000000,scopus,s1,A Title"));
        assert!(!text.contains("topic_labels"));
    }

    #[test]
    fn tag_columns_appended_when_tags_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canonical.csv");
        let tags = vec![TagResult {
            labels: vec!["mobile_money".to_string(), "microfinance".to_string()],
            matched: Default::default(),
        }];
        write_canonical_csv(&path, &[canonical("s1", "A Title")], Some(&tags)).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("topic_labels,topic_count"));
        assert!(text.contains("mobile_money; microfinance,2"));
    }
}
