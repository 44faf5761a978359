//! Topical tagging of the canonical corpus against a YAML term dictionary.
//!
//! The dictionary maps category keys to term lists, plus a `tagging_rules`
//! section controlling case sensitivity, whole-word matching and which raw
//! text fields are searched. Tagging appends columns to the canonical
//! dataset; it never alters the dedup outputs.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::export::csv_writer_with_bom;
use crate::models::CanonicalRecord;

fn default_true() -> bool {
    true
}

fn default_search_fields() -> Vec<String> {
    vec![
        "title_raw".to_string(),
        "abstract_raw".to_string(),
        "keywords_raw".to_string(),
    ]
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaggingRules {
    #[serde(default)]
    pub case_sensitive: bool,

    #[serde(default = "default_true")]
    pub whole_words_only: bool,

    #[serde(default = "default_search_fields")]
    pub search_fields: Vec<String>,
}

impl Default for TaggingRules {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            whole_words_only: true,
            search_fields: default_search_fields(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CategoryDef {
    terms: Vec<String>,
}

struct CompiledTerm {
    term: String,
    pattern: Regex,
}

/// A compiled term dictionary, ready to tag records.
pub struct TopicDictionary {
    rules: TaggingRules,
    categories: Vec<(String, Vec<CompiledTerm>)>,
}

/// Labels and per-category matched terms for one record.
#[derive(Debug, Clone, Default)]
pub struct TagResult {
    pub labels: Vec<String>,
    pub matched: BTreeMap<String, Vec<String>>,
}

impl TopicDictionary {
    /// Load and compile a dictionary from YAML. Unparseable YAML or an
    /// unbuildable term pattern is a structural error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::InputNotFound(path.to_path_buf()));
        }
        let raw: BTreeMap<String, serde_yaml::Value> =
            serde_yaml::from_str(&fs::read_to_string(path)?)?;
        Self::from_sections(raw)
    }

    fn from_sections(mut sections: BTreeMap<String, serde_yaml::Value>) -> Result<Self> {
        let rules = match sections.remove("tagging_rules") {
            Some(value) => serde_yaml::from_value(value)?,
            None => TaggingRules::default(),
        };

        let mut categories = Vec::new();
        for (key, value) in sections {
            // Sections without a terms list are ignored, matching the
            // dictionary format's allowance for metadata entries.
            let Ok(def) = serde_yaml::from_value::<CategoryDef>(value) else {
                continue;
            };
            let mut compiled = Vec::with_capacity(def.terms.len());
            for term in def.terms {
                let escaped = regex::escape(&term);
                let source = if rules.whole_words_only {
                    format!(r"\b{escaped}\b")
                } else {
                    escaped
                };
                let pattern = RegexBuilder::new(&source)
                    .case_insensitive(!rules.case_sensitive)
                    .build()
                    .map_err(|e| {
                        PipelineError::Config(format!("bad dictionary term '{term}': {e}"))
                    })?;
                compiled.push(CompiledTerm { term, pattern });
            }
            categories.push((key, compiled));
        }

        Ok(Self { rules, categories })
    }

    /// Tag a single record over its configured search fields.
    pub fn tag(&self, record: &CanonicalRecord) -> TagResult {
        let raw = &record.record.raw;
        let text = self
            .rules
            .search_fields
            .iter()
            .filter_map(|field| match field.as_str() {
                "title_raw" => raw.title_raw.as_deref(),
                "abstract_raw" => raw.abstract_raw.as_deref(),
                "keywords_raw" => raw.keywords_raw.as_deref(),
                "authors_raw" => raw.authors_raw.as_deref(),
                "affiliations_raw" => raw.affiliations_raw.as_deref(),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" ");

        let mut result = TagResult::default();
        if text.is_empty() {
            return result;
        }

        for (category, terms) in &self.categories {
            let matched: Vec<String> = terms
                .iter()
                .filter(|t| t.pattern.is_match(&text))
                .map(|t| t.term.clone())
                .collect();
            if !matched.is_empty() {
                result.labels.push(category.clone());
                result.matched.insert(category.clone(), matched);
            }
        }

        result
    }

    /// Tag every canonical record, returning a slice parallel to the input.
    pub fn tag_all(&self, records: &[CanonicalRecord]) -> Vec<TagResult> {
        let results: Vec<TagResult> = records.iter().map(|r| self.tag(r)).collect();

        let tagged = results.iter().filter(|r| !r.labels.is_empty()).count();
        if !records.is_empty() {
            tracing::info!(
                tagged,
                total = records.len(),
                pct = format!("{:.1}", tagged as f64 / records.len() as f64 * 100.0),
                "topic tagging complete"
            );
        }

        results
    }
}

/// Write the per-record tagging audit:
/// `doc_id, matched_terms, topic_labels, topic_count`.
pub fn write_tagging_audit_csv(
    path: &Path,
    records: &[CanonicalRecord],
    tags: &[TagResult],
) -> Result<()> {
    let mut writer = csv_writer_with_bom(path)?;
    writer.write_record(["doc_id", "matched_terms", "topic_labels", "topic_count"])?;
    for (record, tag) in records.iter().zip(tags) {
        let all_terms: Vec<&str> = tag
            .matched
            .values()
            .flat_map(|terms| terms.iter().map(String::as_str))
            .collect();
        writer.write_record([
            record.canonical_id.as_str(),
            &all_terms.join("; "),
            &tag.labels.join("; "),
            &tag.labels.len().to_string(),
        ])?;
    }
    writer.flush()?;
    tracing::info!(path = %path.display(), rows = records.len(), "wrote tagging audit");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::clean_record;
    use crate::models::{RawRecord, SourceDb};

    fn canonical(title: Option<&str>, abstract_text: Option<&str>) -> CanonicalRecord {
        let mut raw = RawRecord::new(SourceDb::Scopus, "s1");
        raw.title_raw = title.map(str::to_string);
        raw.abstract_raw = abstract_text.map(str::to_string);
        CanonicalRecord {
            record: clean_record(raw),
            canonical_id: "FI_000000".to_string(),
            has_scopus: true,
            has_wos: false,
        }
    }

    fn dictionary(yaml: &str) -> TopicDictionary {
        let sections: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_str(yaml).unwrap();
        TopicDictionary::from_sections(sections).unwrap()
    }

    #[test]
    fn whole_word_matching_respects_boundaries() {
        let dict = dictionary(
            "mobile_money:\n  terms:\n    - mobile money\n    - m-pesa\n",
        );

        let hit = dict.tag(&canonical(Some("Mobile money adoption in Kenya"), None));
        assert_eq!(hit.labels, vec!["mobile_money"]);
        assert_eq!(hit.matched["mobile_money"], vec!["mobile money"]);

        // "mobile moneylender" must not match the whole-word term.
        let miss = dict.tag(&canonical(Some("The mobile moneylender"), None));
        assert!(miss.labels.is_empty());
    }

    #[test]
    fn case_insensitive_by_default() {
        let dict = dictionary("microfinance:\n  terms:\n    - Microfinance\n");
        let result = dict.tag(&canonical(None, Some("a study of MICROFINANCE outcomes")));
        assert_eq!(result.labels, vec!["microfinance"]);
    }

    #[test]
    fn substring_matching_when_whole_words_disabled() {
        let dict = dictionary(
            "banking:\n  terms:\n    - bank\ntagging_rules:\n  whole_words_only: false\n",
        );
        let result = dict.tag(&canonical(Some("Interbanking systems"), None));
        assert_eq!(result.labels, vec!["banking"]);
    }

    #[test]
    fn search_fields_limit_where_terms_match() {
        let dict = dictionary(
            "credit:\n  terms:\n    - credit\ntagging_rules:\n  search_fields:\n    - title_raw\n",
        );
        // Term only appears in the abstract, which is not searched.
        let result = dict.tag(&canonical(Some("Savings behavior"), Some("credit access")));
        assert!(result.labels.is_empty());
    }

    #[test]
    fn untagged_record_gets_empty_result() {
        let dict = dictionary("credit:\n  terms:\n    - credit\n");
        let result = dict.tag(&canonical(None, None));
        assert!(result.labels.is_empty());
        assert!(result.matched.is_empty());
    }

    #[test]
    fn metadata_sections_without_terms_are_ignored() {
        let dict = dictionary(
            "version: 3\ncredit:\n  terms:\n    - credit\n",
        );
        let result = dict.tag(&canonical(Some("credit scoring"), None));
        assert_eq!(result.labels, vec!["credit"]);
    }

    #[test]
    fn tagging_audit_rows_match_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tagging_audit.csv");
        let dict = dictionary("credit:\n  terms:\n    - credit\n");

        let records = vec![canonical(Some("credit scoring"), None)];
        let tags = dict.tag_all(&records);
        write_tagging_audit_csv(&path, &records, &tags).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("doc_id,matched_terms,topic_labels,topic_count"));
        assert!(text.contains("FI_000000,credit,credit,1"));
    }
}
