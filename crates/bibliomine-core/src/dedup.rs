//! Within-source and cross-source deduplication.
//!
//! Both stages share the same two-tier strategy: records are grouped by
//! normalized DOI first, then DOI-less records by the composite
//! `title_norm|year_clean` key. Records lacking both keys cannot be
//! deduplicated with confidence and always pass through untouched.
//!
//! Grouping uses an arena of records plus a `BTreeMap` from key to record
//! indices, so group traversal (and therefore the final row order that
//! canonical ids are assigned from) is pinned: DOI survivors ascending by
//! DOI, then secondary-key survivors ascending by key, then pass-through
//! records in input order.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::models::{CanonicalRecord, CleanedRecord, Collision, SourceDb};

/// Result of deduplicating one source database.
#[derive(Debug)]
pub struct WithinDedupOutcome {
    pub records: Vec<CleanedRecord>,
    pub doi_removed: usize,
    pub title_year_removed: usize,
}

/// Result of merging both deduplicated sources into the canonical corpus.
#[derive(Debug)]
pub struct CrossDedupOutcome {
    pub canonical: Vec<CanonicalRecord>,
    pub collisions: Vec<Collision>,
    pub doi_removed: usize,
    pub title_year_removed: usize,
}

struct Partition {
    doi_groups: BTreeMap<String, Vec<usize>>,
    secondary_groups: BTreeMap<String, Vec<usize>>,
    passthrough: Vec<usize>,
}

fn partition(records: &[CleanedRecord]) -> Partition {
    let mut doi_groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    let mut secondary_groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    let mut passthrough = Vec::new();

    for (idx, record) in records.iter().enumerate() {
        if let Some(doi) = record.doi_clean.as_ref() {
            doi_groups.entry(doi.clone()).or_default().push(idx);
        } else if let Some(key) = record.secondary_key() {
            secondary_groups.entry(key).or_default().push(idx);
        } else {
            passthrough.push(idx);
        }
    }

    Partition {
        doi_groups,
        secondary_groups,
        passthrough,
    }
}

/// Pick the surviving member of a group: completeness score descending, then
/// has-references descending, then `raw_record_id` ascending. The id tiebreak
/// makes selection reproducible when everything else is equal.
fn select_survivor(indices: &[usize], records: &[CleanedRecord]) -> usize {
    *indices
        .iter()
        .min_by_key(|&&idx| {
            let r = &records[idx];
            (
                Reverse(r.completeness_score),
                Reverse(r.raw.has_references()),
                r.raw.raw_record_id.clone(),
            )
        })
        .expect("group is never empty")
}

/// As [`select_survivor`], with source preference inserted before the id
/// tiebreak for cross-source groups.
fn select_survivor_preferring(
    indices: &[usize],
    records: &[CleanedRecord],
    preferred_db: SourceDb,
) -> usize {
    *indices
        .iter()
        .min_by_key(|&&idx| {
            let r = &records[idx];
            (
                Reverse(r.completeness_score),
                Reverse(r.raw.has_references()),
                Reverse(r.raw.source_db == preferred_db),
                r.raw.raw_record_id.clone(),
            )
        })
        .expect("group is never empty")
}

/// Collapse duplicate records inside one source database.
///
/// Never fails; an empty input yields an empty outcome.
pub fn deduplicate_within_db(
    records: Vec<CleanedRecord>,
    source_db: SourceDb,
) -> WithinDedupOutcome {
    let input_len = records.len();
    let parts = partition(&records);

    let mut doi_removed = 0;
    let mut title_year_removed = 0;
    let mut survivors: Vec<usize> = Vec::new();

    for indices in parts.doi_groups.values() {
        doi_removed += indices.len() - 1;
        survivors.push(select_survivor(indices, &records));
    }
    for indices in parts.secondary_groups.values() {
        title_year_removed += indices.len() - 1;
        survivors.push(select_survivor(indices, &records));
    }
    survivors.extend(parts.passthrough);

    let kept = take_indices(records, &survivors);

    tracing::info!(
        source = %source_db,
        input = input_len,
        kept = kept.len(),
        removed = input_len - kept.len(),
        "within-source deduplication"
    );

    WithinDedupOutcome {
        records: kept,
        doi_removed,
        title_year_removed,
    }
}

/// Merge the two within-source-deduplicated sets into the canonical corpus.
///
/// DOI groups with more than one member are logged as primary collisions
/// (high-confidence merges, not review items); secondary-key groups with
/// more than one member are returned as [`Collision`] records for human
/// review. Canonical ids are assigned over the final row order.
pub fn deduplicate_cross_db(
    scopus_records: Vec<CleanedRecord>,
    wos_records: Vec<CleanedRecord>,
    preferred_db: SourceDb,
) -> CrossDedupOutcome {
    let mut records = scopus_records;
    records.extend(wos_records);
    let merged_len = records.len();

    let parts = partition(&records);

    let mut doi_removed = 0;
    let mut title_year_removed = 0;
    let mut collisions = Vec::new();
    let mut survivors: Vec<usize> = Vec::new();

    for (doi, indices) in &parts.doi_groups {
        if indices.len() > 1 {
            doi_removed += indices.len() - 1;
            let ids: Vec<&str> = indices
                .iter()
                .map(|&i| records[i].raw.raw_record_id.as_str())
                .collect();
            tracing::warn!(doi = %doi, n_records = indices.len(), record_ids = ?ids, "primary-key collision");
        }
        survivors.push(select_survivor_preferring(
            indices,
            &records,
            preferred_db,
        ));
    }

    for indices in parts.secondary_groups.values() {
        if indices.len() > 1 {
            title_year_removed += indices.len() - 1;
            let first = &records[indices[0]];
            collisions.push(Collision {
                title_norm: first.title_norm.clone(),
                year_clean: first.year_clean,
                n_records: indices.len(),
                sources: indices.iter().map(|&i| records[i].raw.source_db).collect(),
                record_ids: indices
                    .iter()
                    .map(|&i| records[i].raw.raw_record_id.clone())
                    .collect(),
                titles: indices
                    .iter()
                    .map(|&i| records[i].raw.title_raw.clone().unwrap_or_default())
                    .collect(),
            });
        }
        survivors.push(select_survivor_preferring(
            indices,
            &records,
            preferred_db,
        ));
    }
    survivors.extend(parts.passthrough);

    let kept = take_indices(records, &survivors);

    let canonical: Vec<CanonicalRecord> = kept
        .into_iter()
        .enumerate()
        .map(|(row, record)| {
            let source = record.raw.source_db;
            CanonicalRecord {
                record,
                canonical_id: format!("FI_{row:06}"),
                has_scopus: source == SourceDb::Scopus,
                has_wos: source == SourceDb::Wos,
            }
        })
        .collect();

    tracing::info!(
        input = merged_len,
        kept = canonical.len(),
        removed = merged_len - canonical.len(),
        secondary_collisions = collisions.len(),
        "cross-source deduplication"
    );

    CrossDedupOutcome {
        canonical,
        collisions,
        doi_removed,
        title_year_removed,
    }
}

/// Move the records at `indices` out of the arena, in index-list order.
fn take_indices(records: Vec<CleanedRecord>, indices: &[usize]) -> Vec<CleanedRecord> {
    let mut slots: Vec<Option<CleanedRecord>> = records.into_iter().map(Some).collect();
    indices
        .iter()
        .map(|&i| slots[i].take().expect("survivor indices are unique"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::clean_record;
    use crate::models::RawRecord;

    fn record(
        source: SourceDb,
        id: &str,
        doi: Option<&str>,
        title: Option<&str>,
        year: Option<&str>,
    ) -> CleanedRecord {
        let mut raw = RawRecord::new(source, id);
        raw.doi_raw = doi.map(str::to_string);
        raw.title_raw = title.map(str::to_string);
        raw.year_raw = year.map(str::to_string);
        clean_record(raw)
    }

    #[test]
    fn within_db_keeps_highest_score_per_doi() {
        let mut low = record(SourceDb::Scopus, "1", Some("10.1234/test"), None, None);
        low.completeness_score = 5;
        let mut high = record(SourceDb::Scopus, "2", Some("10.1234/test"), None, None);
        high.completeness_score = 9;
        let other = record(SourceDb::Scopus, "3", Some("10.5678/other"), None, None);

        let outcome = deduplicate_within_db(vec![low, high, other], SourceDb::Scopus);
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.doi_removed, 1);
        assert_eq!(outcome.title_year_removed, 0);

        let survivor = outcome
            .records
            .iter()
            .find(|r| r.doi_clean.as_deref() == Some("10.1234/test"))
            .unwrap();
        assert_eq!(survivor.raw.raw_record_id, "2");
    }

    #[test]
    fn within_db_references_break_score_ties() {
        let mut plain = record(SourceDb::Wos, "a", Some("10.1/x"), None, None);
        let mut with_refs = record(SourceDb::Wos, "b", Some("10.1/x"), None, None);
        with_refs.raw.references_raw = Some("Smith 2019".to_string());
        plain.completeness_score = 0;
        with_refs.completeness_score = 0;

        let outcome = deduplicate_within_db(vec![plain, with_refs], SourceDb::Wos);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].raw.raw_record_id, "b");
    }

    #[test]
    fn within_db_id_is_final_tiebreak() {
        let a = record(SourceDb::Scopus, "zzz", Some("10.1/x"), None, None);
        let b = record(SourceDb::Scopus, "aaa", Some("10.1/x"), None, None);

        let outcome = deduplicate_within_db(vec![a, b], SourceDb::Scopus);
        assert_eq!(outcome.records[0].raw.raw_record_id, "aaa");
    }

    #[test]
    fn within_db_secondary_key_groups_normalized_titles() {
        let a = record(SourceDb::Scopus, "1", None, Some("Foo Bar"), Some("2020"));
        let b = record(SourceDb::Scopus, "2", None, Some("foo   bar!!"), Some("2020"));

        let outcome = deduplicate_within_db(vec![a, b], SourceDb::Scopus);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.title_year_removed, 1);
    }

    #[test]
    fn within_db_keyless_records_all_pass_through() {
        let a = record(SourceDb::Wos, "1", None, None, None);
        let b = record(SourceDb::Wos, "2", None, None, None);
        let c = record(SourceDb::Wos, "3", None, Some("Title"), None);

        let outcome = deduplicate_within_db(vec![a, b, c], SourceDb::Wos);
        assert_eq!(outcome.records.len(), 3);
        assert_eq!(outcome.doi_removed, 0);
        assert_eq!(outcome.title_year_removed, 0);
    }

    #[test]
    fn within_db_empty_input() {
        let outcome = deduplicate_within_db(Vec::new(), SourceDb::Scopus);
        assert!(outcome.records.is_empty());
    }

    #[test]
    fn cross_db_doi_match_takes_priority_over_secondary_key() {
        // Same DOI, different titles: merged by DOI, no secondary collision.
        let s = record(
            SourceDb::Scopus,
            "s1",
            Some("10.1/shared"),
            Some("Title A"),
            Some("2020"),
        );
        let w = record(
            SourceDb::Wos,
            "w1",
            Some("10.1/shared"),
            Some("Title B"),
            Some("2020"),
        );

        let outcome = deduplicate_cross_db(vec![s], vec![w], SourceDb::Scopus);
        assert_eq!(outcome.canonical.len(), 1);
        assert_eq!(outcome.doi_removed, 1);
        assert!(outcome.collisions.is_empty());
    }

    #[test]
    fn cross_db_secondary_collision_is_recorded() {
        let s = record(SourceDb::Scopus, "s1", None, Some("Foo Bar"), Some("2020"));
        let w = record(SourceDb::Wos, "w1", None, Some("foo   bar!!"), Some("2020"));

        let outcome = deduplicate_cross_db(vec![s], vec![w], SourceDb::Scopus);
        assert_eq!(outcome.canonical.len(), 1);
        assert_eq!(outcome.collisions.len(), 1);

        let collision = &outcome.collisions[0];
        assert_eq!(collision.title_norm, "foo bar");
        assert_eq!(collision.year_clean, Some(2020));
        assert_eq!(collision.n_records, 2);
        assert_eq!(collision.sources, vec![SourceDb::Scopus, SourceDb::Wos]);
        assert_eq!(collision.record_ids, vec!["s1", "w1"]);
    }

    #[test]
    fn cross_db_preferred_source_breaks_ties() {
        let s = record(SourceDb::Scopus, "same", Some("10.1/x"), None, None);
        let w = record(SourceDb::Wos, "same", Some("10.1/x"), None, None);

        let outcome = deduplicate_cross_db(vec![s.clone()], vec![w.clone()], SourceDb::Wos);
        assert_eq!(outcome.canonical[0].record.raw.source_db, SourceDb::Wos);

        let outcome = deduplicate_cross_db(vec![s], vec![w], SourceDb::Scopus);
        assert_eq!(outcome.canonical[0].record.raw.source_db, SourceDb::Scopus);
    }

    #[test]
    fn cross_db_score_outranks_source_preference() {
        let mut s = record(SourceDb::Scopus, "s1", Some("10.1/x"), None, None);
        let mut w = record(SourceDb::Wos, "w1", Some("10.1/x"), None, None);
        s.completeness_score = 2;
        w.completeness_score = 7;

        let outcome = deduplicate_cross_db(vec![s], vec![w], SourceDb::Scopus);
        assert_eq!(outcome.canonical[0].record.raw.source_db, SourceDb::Wos);
    }

    #[test]
    fn cross_db_keyless_records_never_merge() {
        let s = record(SourceDb::Scopus, "s1", None, None, None);
        let w = record(SourceDb::Wos, "w1", None, None, None);

        let outcome = deduplicate_cross_db(vec![s], vec![w], SourceDb::Scopus);
        assert_eq!(outcome.canonical.len(), 2);
        assert!(outcome.collisions.is_empty());
    }

    #[test]
    fn provenance_flags_reflect_survivor_source_only() {
        let s = record(SourceDb::Scopus, "s1", Some("10.1/x"), None, None);
        let w = record(SourceDb::Wos, "w1", Some("10.1/x"), None, None);

        let outcome = deduplicate_cross_db(vec![s], vec![w], SourceDb::Scopus);
        let survivor = &outcome.canonical[0];
        assert!(survivor.has_scopus);
        assert!(!survivor.has_wos);
    }

    #[test]
    fn canonical_ids_are_contiguous_and_zero_padded() {
        let records: Vec<CleanedRecord> = (0..3)
            .map(|i| {
                record(
                    SourceDb::Scopus,
                    &format!("s{i}"),
                    Some(&format!("10.1/d{i}")),
                    None,
                    None,
                )
            })
            .collect();

        let outcome = deduplicate_cross_db(records, Vec::new(), SourceDb::Scopus);
        let ids: Vec<&str> = outcome
            .canonical
            .iter()
            .map(|c| c.canonical_id.as_str())
            .collect();
        assert_eq!(ids, vec!["FI_000000", "FI_000001", "FI_000002"]);
    }

    #[test]
    fn cross_db_is_deterministic_across_reruns() {
        let make_inputs = || {
            let scopus = vec![
                record(SourceDb::Scopus, "s2", Some("10.1/b"), None, None),
                record(SourceDb::Scopus, "s1", Some("10.1/a"), None, None),
                record(SourceDb::Scopus, "s3", None, Some("Shared Title"), Some("2021")),
            ];
            let wos = vec![
                record(SourceDb::Wos, "w1", Some("10.1/a"), None, None),
                record(SourceDb::Wos, "w2", None, Some("Shared Title"), Some("2021")),
                record(SourceDb::Wos, "w3", None, None, None),
            ];
            (scopus, wos)
        };

        let (s1, w1) = make_inputs();
        let (s2, w2) = make_inputs();
        let first = deduplicate_cross_db(s1, w1, SourceDb::Scopus);
        let second = deduplicate_cross_db(s2, w2, SourceDb::Scopus);

        let ids = |o: &CrossDedupOutcome| {
            o.canonical
                .iter()
                .map(|c| (c.canonical_id.clone(), c.record.raw.raw_record_id.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn cross_db_empty_inputs() {
        let outcome = deduplicate_cross_db(Vec::new(), Vec::new(), SourceDb::Scopus);
        assert!(outcome.canonical.is_empty());
        assert!(outcome.collisions.is_empty());
    }

    #[test]
    fn record_count_is_conserved() {
        let scopus = vec![
            record(SourceDb::Scopus, "s1", Some("10.1/a"), None, None),
            record(SourceDb::Scopus, "s2", Some("10.1/a"), None, None),
            record(SourceDb::Scopus, "s3", None, Some("T"), Some("2020")),
            record(SourceDb::Scopus, "s4", None, None, None),
        ];
        let wos = vec![
            record(SourceDb::Wos, "w1", Some("10.1/a"), None, None),
            record(SourceDb::Wos, "w2", None, Some("T"), Some("2020")),
        ];
        let total = scopus.len() + wos.len();

        let outcome = deduplicate_cross_db(scopus, wos, SourceDb::Scopus);
        let removed = outcome.doi_removed + outcome.title_year_removed;
        assert_eq!(outcome.canonical.len() + removed, total);
    }
}
