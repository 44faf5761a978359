//! Metadata completeness scoring.
//!
//! The score is a numeric proxy for metadata richness, used only to break
//! ties among duplicate candidates: higher score wins. One explicit additive
//! scheme; it is total, independent of the source database, and monotonic in
//! the number of non-empty fields.

use crate::models::RawRecord;

fn present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Additive completeness score:
/// abstract +3, keywords +2, references +2, affiliations +1, cited-by > 0 +1.
pub fn completeness_score(record: &RawRecord) -> u32 {
    let mut score = 0;

    if present(record.abstract_raw.as_deref()) {
        score += 3;
    }
    if present(record.keywords_raw.as_deref()) {
        score += 2;
    }
    if present(record.references_raw.as_deref()) {
        score += 2;
    }
    if present(record.affiliations_raw.as_deref()) {
        score += 1;
    }
    if record.cited_by_raw > 0 {
        score += 1;
    }

    score
}
