//! Deterministic per-field normalization. Every function here is total:
//! malformed input degrades to an absent/empty sentinel, never an error.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::{CleanedRecord, RawRecord};
use crate::score::completeness_score;

/// Prefixes stripped from raw DOI strings, tried in order; first match wins.
const DOI_PREFIXES: &[&str] = &[
    "doi:",
    "doi/",
    "https://doi.org/",
    "http://doi.org/",
    "dx.doi.org/",
    "doi.org/",
];

/// Separators that indicate a multi-DOI cell; only the first segment is kept.
const DOI_SEPARATORS: &[&str] = &[";", ",", " and ", " & "];

static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(19\d{2}|20[0-9]\d|2100)\b").expect("valid year regex"));

/// Normalize a raw DOI string.
///
/// Lowercase, trim, strip known prefixes, drop trailing punctuation, keep the
/// first segment of multi-DOI cells, then validate. Returns `None` unless the
/// result starts with `10.` and contains `/`; anything looser would let false
/// positives into the primary join key.
pub fn clean_doi(doi_raw: &str) -> Option<String> {
    let mut doi = doi_raw.to_lowercase().trim().to_string();
    if doi.is_empty() {
        return None;
    }

    for prefix in DOI_PREFIXES {
        if let Some(rest) = doi.strip_prefix(prefix) {
            doi = rest.trim().to_string();
            break;
        }
    }

    doi = doi.trim_end_matches(['.', ',', ';']).to_string();

    for sep in DOI_SEPARATORS {
        if let Some((first, _)) = doi.split_once(sep) {
            doi = first.trim().to_string();
            break;
        }
    }

    if doi.starts_with("10.") && doi.contains('/') {
        Some(doi)
    } else {
        None
    }
}

/// Normalize a title for secondary-key matching.
///
/// NFKD-decompose, strip combining marks, lowercase, replace `&` with `and`,
/// drop everything outside word characters (alphanumeric or `_`) and
/// whitespace, collapse whitespace. Degenerate input yields the empty string,
/// which disqualifies the record from secondary-key matching.
pub fn normalize_title(title_raw: &str) -> String {
    let decomposed: String = title_raw.nfkd().filter(|c| !is_combining_mark(*c)).collect();

    let replaced = decomposed.to_lowercase().replace('&', "and");

    let kept: String = replaced
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract the first 4-digit year in [1900, 2100] at a word boundary.
///
/// Year ranges like "2023-2024" resolve to the leftmost match.
pub fn clean_year(year_raw: &str) -> Option<i32> {
    YEAR_RE
        .find(year_raw.trim())
        .and_then(|m| m.as_str().parse::<i32>().ok())
}

/// Derive all cleaned fields and the completeness score for one raw record.
pub fn clean_record(raw: RawRecord) -> CleanedRecord {
    let doi_clean = raw.doi_raw.as_deref().and_then(clean_doi);
    let title_norm = raw
        .title_raw
        .as_deref()
        .map(normalize_title)
        .unwrap_or_default();
    let year_clean = raw.year_raw.as_deref().and_then(clean_year);
    let completeness_score = completeness_score(&raw);

    CleanedRecord {
        raw,
        doi_clean,
        title_norm,
        year_clean,
        completeness_score,
    }
}

/// Clean a whole batch, preserving input order.
pub fn clean_records(records: Vec<RawRecord>) -> Vec<CleanedRecord> {
    let records: Vec<CleanedRecord> = records.into_iter().map(clean_record).collect();

    let with_doi = records.iter().filter(|r| r.doi_clean.is_some()).count();
    if !records.is_empty() {
        tracing::info!(
            total = records.len(),
            doi_coverage_pct = format!("{:.1}", with_doi as f64 / records.len() as f64 * 100.0),
            "cleaning complete"
        );
    }

    records
}
