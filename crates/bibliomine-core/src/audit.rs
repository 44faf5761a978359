//! Deduplication audit artifacts: summary statistics, the per-input-record
//! mapping, and the secondary-key collisions table.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::dedup::{CrossDedupOutcome, WithinDedupOutcome};
use crate::export::csv_writer_with_bom;
use crate::models::{
    CanonicalRecord, CleanedRecord, Collision, DedupReason, MappingRow, SourceDb,
};
use crate::Result;

#[derive(Debug, Clone, Default, Serialize)]
pub struct InputFiles {
    pub scopus: Option<String>,
    pub wos: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceCounts {
    pub scopus: usize,
    pub wos: usize,
    pub total: usize,
}

impl SourceCounts {
    pub fn new(scopus: usize, wos: usize) -> Self {
        Self {
            scopus,
            wos,
            total: scopus + wos,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputCounts {
    pub canonical_records: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WithinSourceStats {
    pub scopus_doi_removed: usize,
    pub scopus_title_year_removed: usize,
    pub wos_doi_removed: usize,
    pub wos_title_year_removed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrossSourceStats {
    pub doi_removed: usize,
    pub title_year_removed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DedupStats {
    pub within_source: WithinSourceStats,
    pub cross_source: CrossSourceStats,
    pub total_removed: usize,
    pub deduplication_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollisionCounts {
    pub secondary_key_collisions: usize,
}

/// Summary of the full deduplication run, serialized to `dedup_summary.json`.
#[derive(Debug, Clone, Serialize)]
pub struct DedupSummary {
    #[serde(rename = "input_file_paths")]
    pub input_files: InputFiles,
    pub input: SourceCounts,
    pub after_within_db_dedup: SourceCounts,
    pub output: OutputCounts,
    pub deduplication: DedupStats,
    pub collisions: CollisionCounts,
}

/// Build the run summary from per-stage outcomes and input counts.
pub fn build_summary(
    input_files: InputFiles,
    scopus_input: usize,
    wos_input: usize,
    scopus_within: &WithinDedupOutcome,
    wos_within: &WithinDedupOutcome,
    cross: &CrossDedupOutcome,
) -> DedupSummary {
    let total_input = scopus_input + wos_input;
    let canonical_count = cross.canonical.len();
    let total_removed = total_input - canonical_count;
    // Guarded: an all-empty run reports a 0% rate rather than dividing by zero.
    let deduplication_rate = if total_input > 0 {
        total_removed as f64 / total_input as f64 * 100.0
    } else {
        0.0
    };

    DedupSummary {
        input_files,
        input: SourceCounts::new(scopus_input, wos_input),
        after_within_db_dedup: SourceCounts::new(
            scopus_within.records.len(),
            wos_within.records.len(),
        ),
        output: OutputCounts {
            canonical_records: canonical_count,
        },
        deduplication: DedupStats {
            within_source: WithinSourceStats {
                scopus_doi_removed: scopus_within.doi_removed,
                scopus_title_year_removed: scopus_within.title_year_removed,
                wos_doi_removed: wos_within.doi_removed,
                wos_title_year_removed: wos_within.title_year_removed,
            },
            cross_source: CrossSourceStats {
                doi_removed: cross.doi_removed,
                title_year_removed: cross.title_year_removed,
            },
            total_removed,
            deduplication_rate,
        },
        collisions: CollisionCounts {
            secondary_key_collisions: cross.collisions.len(),
        },
    }
}

/// Reconcile every original record against the canonical result.
///
/// Kept records appear first (canonical order), then removed records in
/// input order with the reason their dedup key implies: `doi` if a clean DOI
/// was present, `title_year` if both secondary-key components were, `other`
/// when the record was unmatchable (unmatchable records always survive, so
/// `other` never appears in practice).
pub fn generate_mapping(
    cleaned: &[CleanedRecord],
    canonical: &[CanonicalRecord],
) -> Vec<MappingRow> {
    let kept_keys: HashSet<(SourceDb, &str)> = canonical
        .iter()
        .map(|c| (c.record.raw.source_db, c.record.raw.raw_record_id.as_str()))
        .collect();

    let mut rows: Vec<MappingRow> = canonical
        .iter()
        .map(|c| MappingRow {
            raw_record_id: c.record.raw.raw_record_id.clone(),
            source_db: c.record.raw.source_db,
            doc_id_canonical: Some(c.canonical_id.clone()),
            dedup_reason: DedupReason::Kept,
        })
        .collect();

    for record in cleaned {
        let key = (record.raw.source_db, record.raw.raw_record_id.as_str());
        if kept_keys.contains(&key) {
            continue;
        }
        let reason = if record.doi_clean.is_some() {
            DedupReason::Doi
        } else if record.secondary_key().is_some() {
            DedupReason::TitleYear
        } else {
            DedupReason::Other
        };
        rows.push(MappingRow {
            raw_record_id: record.raw.raw_record_id.clone(),
            source_db: record.raw.source_db,
            doc_id_canonical: None,
            dedup_reason: reason,
        });
    }

    rows
}

pub fn write_summary_json(path: &Path, summary: &DedupSummary) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(summary)?)?;
    tracing::info!(path = %path.display(), "wrote deduplication summary");
    Ok(())
}

pub fn write_mapping_csv(path: &Path, rows: &[MappingRow]) -> Result<()> {
    let mut writer = csv_writer_with_bom(path)?;
    writer.write_record(["raw_record_id", "source_db", "doc_id_canonical", "dedup_reason"])?;
    for row in rows {
        writer.write_record([
            row.raw_record_id.as_str(),
            &row.source_db.to_string(),
            row.doc_id_canonical.as_deref().unwrap_or(""),
            &row.dedup_reason.to_string(),
        ])?;
    }
    writer.flush()?;
    tracing::info!(path = %path.display(), rows = rows.len(), "wrote deduplication mapping");
    Ok(())
}

/// Write the collisions table; a run with zero collisions still produces a
/// header-only file so downstream consumers can rely on its presence.
pub fn write_collisions_csv(path: &Path, collisions: &[Collision]) -> Result<()> {
    let mut writer = csv_writer_with_bom(path)?;
    writer.write_record([
        "title_norm",
        "year_clean",
        "n_records",
        "sources",
        "record_ids",
        "titles",
    ])?;
    for collision in collisions {
        let sources = collision
            .sources
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        writer.write_record([
            collision.title_norm.as_str(),
            &collision
                .year_clean
                .map(|y| y.to_string())
                .unwrap_or_default(),
            &collision.n_records.to_string(),
            &sources,
            &collision.record_ids.join("; "),
            &collision.titles.join("; "),
        ])?;
    }
    writer.flush()?;
    tracing::info!(path = %path.display(), collisions = collisions.len(), "wrote collisions table");
    Ok(())
}
