use serde::{Deserialize, Serialize};

/// Source database a record was exported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceDb {
    Scopus,
    Wos,
}

impl std::fmt::Display for SourceDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SourceDb::Scopus => "scopus",
            SourceDb::Wos => "wos",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for SourceDb {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "scopus" => Ok(SourceDb::Scopus),
            "wos" => Ok(SourceDb::Wos),
            other => Err(format!("unknown source database: {other}")),
        }
    }
}

/// One row per publication as reported by a single source, before any
/// normalization. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    pub source_db: SourceDb,
    pub raw_record_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_raw: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_raw: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi_raw: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors_raw: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliations_raw: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abstract_raw: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords_raw: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references_raw: Option<String>,

    #[serde(default)]
    pub cited_by_raw: u64,
}

impl RawRecord {
    pub fn new(source_db: SourceDb, raw_record_id: impl Into<String>) -> Self {
        Self {
            source_db,
            raw_record_id: raw_record_id.into(),
            title_raw: None,
            year_raw: None,
            doi_raw: None,
            authors_raw: None,
            affiliations_raw: None,
            abstract_raw: None,
            keywords_raw: None,
            references_raw: None,
            cited_by_raw: 0,
        }
    }

    pub fn has_references(&self) -> bool {
        self.references_raw
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty())
    }
}

/// A raw record plus derived fields. Produced by the cleaner/scorer stage and
/// never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanedRecord {
    #[serde(flatten)]
    pub raw: RawRecord,

    /// Normalized DOI (`10.<prefix>/<suffix>`, lowercase), if it validated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi_clean: Option<String>,

    /// Normalized title; empty when the raw title was absent or degenerate.
    pub title_norm: String,

    /// Publication year in [1900, 2100], if one was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_clean: Option<i32>,

    pub completeness_score: u32,
}

impl CleanedRecord {
    /// Composite fallback key for records without a DOI. `None` when either
    /// component is missing; such records cannot be deduplicated.
    pub fn secondary_key(&self) -> Option<String> {
        if self.title_norm.is_empty() {
            return None;
        }
        let year = self.year_clean?;
        Some(format!("{}|{}", self.title_norm, year))
    }
}

/// The single surviving representation of a publication after all
/// deduplication stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRecord {
    #[serde(flatten)]
    pub record: CleanedRecord,

    /// Stable identifier `FI_NNNNNN`, assigned by final row order.
    pub canonical_id: String,

    pub has_scopus: bool,
    pub has_wos: bool,
}

/// A secondary-key group with more than one member, surfaced for human review
/// rather than silently resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collision {
    pub title_norm: String,
    pub year_clean: Option<i32>,
    pub n_records: usize,
    pub sources: Vec<SourceDb>,
    pub record_ids: Vec<String>,
    pub titles: Vec<String>,
}

/// Why an input record is present in (or absent from) the canonical set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupReason {
    Kept,
    Doi,
    TitleYear,
    Other,
}

impl std::fmt::Display for DedupReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DedupReason::Kept => "kept",
            DedupReason::Doi => "doi",
            DedupReason::TitleYear => "title_year",
            DedupReason::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// One row per original raw record in the deduplication mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingRow {
    pub raw_record_id: String,
    pub source_db: SourceDb,
    pub doc_id_canonical: Option<String>,
    pub dedup_reason: DedupReason,
}
