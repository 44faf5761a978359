//! Full pipeline orchestration: load → clean → score → deduplicate → audit →
//! tag → export. Each stage fully consumes its input before the next runs;
//! there is no shared mutable state between stages.

use std::path::Path;

use crate::audit::{
    build_summary, generate_mapping, write_collisions_csv, write_mapping_csv,
    write_summary_json, DedupSummary, InputFiles,
};
use crate::clean::clean_records;
use crate::config::PipelineConfig;
use crate::dedup::{deduplicate_cross_db, deduplicate_within_db};
use crate::error::{PipelineError, Result};
use crate::export::write_canonical_csv;
use crate::formats::{load_scopus_file, load_wos_file};
use crate::models::{RawRecord, SourceDb};
use crate::tagging::{write_tagging_audit_csv, TopicDictionary};
use crate::validate::validate_cleaned;

/// What a completed run produced.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub summary: DedupSummary,
    pub canonical_records: usize,
    pub collisions: usize,
}

fn load_or_empty(
    path: &Path,
    load: impl Fn(&Path) -> Result<Vec<RawRecord>>,
    source: SourceDb,
) -> Result<Vec<RawRecord>> {
    if !path.exists() {
        tracing::warn!(source = %source, path = %path.display(), "export file not found, treating source as empty");
        return Ok(Vec::new());
    }
    load(path)
}

/// Run the whole batch pipeline under `config`.
pub fn run(config: &PipelineConfig) -> Result<PipelineOutcome> {
    let paths = &config.paths;

    tracing::info!("loading raw exports");
    let scopus_raw = load_or_empty(&paths.raw_data.scopus, load_scopus_file, SourceDb::Scopus)?;
    let wos_raw = load_or_empty(&paths.raw_data.wos, load_wos_file, SourceDb::Wos)?;

    if scopus_raw.is_empty() && wos_raw.is_empty() {
        return Err(PipelineError::Config(
            "no input data loaded; check paths.raw_data in the parameters file".to_string(),
        ));
    }

    let input_files = InputFiles {
        scopus: paths
            .raw_data
            .scopus
            .exists()
            .then(|| paths.raw_data.scopus.display().to_string()),
        wos: paths
            .raw_data
            .wos
            .exists()
            .then(|| paths.raw_data.wos.display().to_string()),
    };
    let scopus_input = scopus_raw.len();
    let wos_input = wos_raw.len();

    tracing::info!("cleaning and scoring");
    let scopus_cleaned = clean_records(scopus_raw);
    let wos_cleaned = clean_records(wos_raw);
    validate_cleaned(&scopus_cleaned);
    validate_cleaned(&wos_cleaned);

    // Mapping generation needs the pre-dedup cleaned records.
    let mut all_cleaned = scopus_cleaned.clone();
    all_cleaned.extend(wos_cleaned.clone());

    tracing::info!("deduplicating within sources");
    let scopus_within = deduplicate_within_db(scopus_cleaned, SourceDb::Scopus);
    let wos_within = deduplicate_within_db(wos_cleaned, SourceDb::Wos);

    tracing::info!("deduplicating across sources");
    let cross = deduplicate_cross_db(
        scopus_within.records.clone(),
        wos_within.records.clone(),
        config.deduplication.preferred_db,
    );

    tracing::info!("writing deduplication audits");
    let summary = build_summary(
        input_files,
        scopus_input,
        wos_input,
        &scopus_within,
        &wos_within,
        &cross,
    );
    let audits_dir = &paths.outputs.audits;
    write_summary_json(&audits_dir.join("dedup_summary.json"), &summary)?;
    let mapping = generate_mapping(&all_cleaned, &cross.canonical);
    write_mapping_csv(&audits_dir.join("dedup_mapping.csv"), &mapping)?;
    write_collisions_csv(&audits_dir.join("dedup_collisions.csv"), &cross.collisions)?;

    let tags = if config.tagging.enabled {
        match paths.topic_dictionary.as_deref() {
            Some(dictionary_path) => {
                tracing::info!("tagging canonical records");
                let dictionary = TopicDictionary::load(dictionary_path)?;
                let tags = dictionary.tag_all(&cross.canonical);
                write_tagging_audit_csv(
                    &audits_dir.join("tagging_audit.csv"),
                    &cross.canonical,
                    &tags,
                )?;
                Some(tags)
            }
            None => {
                tracing::warn!("tagging enabled but no topic_dictionary path configured, skipping");
                None
            }
        }
    } else {
        None
    };

    tracing::info!("writing canonical dataset");
    write_canonical_csv(&paths.processed_data.canonical, &cross.canonical, tags.as_deref())?;

    Ok(PipelineOutcome {
        canonical_records: cross.canonical.len(),
        collisions: cross.collisions.len(),
        summary,
    })
}
