//! Post-cleaning sanity checks.
//!
//! The cleaners are total, so these checks can only fail if a cleaner's
//! contract is broken; the pipeline logs a warning rather than aborting.

use crate::models::CleanedRecord;

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub invalid_dois: usize,
    pub invalid_years: usize,
}

impl ValidationReport {
    pub fn all_valid(&self) -> bool {
        self.invalid_dois == 0 && self.invalid_years == 0
    }
}

/// Check every cleaned DOI for the `10.<prefix>/<suffix>` shape and every
/// cleaned year for the [1900, 2100] range.
pub fn validate_cleaned(records: &[CleanedRecord]) -> ValidationReport {
    let mut report = ValidationReport::default();

    for record in records {
        if let Some(doi) = record.doi_clean.as_deref() {
            if !doi.starts_with("10.") || !doi.contains('/') {
                report.invalid_dois += 1;
            }
        }
        if let Some(year) = record.year_clean {
            if !(1900..=2100).contains(&year) {
                report.invalid_years += 1;
            }
        }
    }

    if !report.all_valid() {
        tracing::warn!(
            invalid_dois = report.invalid_dois,
            invalid_years = report.invalid_years,
            "cleaned-field validation failed"
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::clean_record;
    use crate::models::{RawRecord, SourceDb};

    #[test]
    fn cleaner_output_always_validates() {
        let mut raw = RawRecord::new(SourceDb::Scopus, "s1");
        raw.doi_raw = Some("doi:10.1000/xyz".to_string());
        raw.year_raw = Some("2020".to_string());
        let report = validate_cleaned(&[clean_record(raw)]);
        assert!(report.all_valid());
    }

    #[test]
    fn hand_built_invalid_fields_are_counted() {
        let raw = RawRecord::new(SourceDb::Wos, "w1");
        let mut record = clean_record(raw);
        record.doi_clean = Some("not-a-doi".to_string());
        record.year_clean = Some(1776);

        let report = validate_cleaned(&[record]);
        assert_eq!(report.invalid_dois, 1);
        assert_eq!(report.invalid_years, 1);
        assert!(!report.all_valid());
    }
}
