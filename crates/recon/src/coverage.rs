//! Independent audit of the canonical table.
//!
//! Read-only: every finding is surfaced in the report and nothing is
//! auto-corrected, so the operator can decide which source is
//! authoritative.

use std::collections::BTreeMap;

use crate::model::{CanonicalDb, CoverageReport};

/// Audit a canonical table for missing pools, missing year mappings,
/// textual duplicates, and invariant violations.
pub fn analyze(db: &CanonicalDb) -> CoverageReport {
    let mut report = CoverageReport {
        makes: db.makes.len(),
        ..Default::default()
    };

    for (make, models) in &db.makes {
        let total_entries: usize = models
            .values()
            .flat_map(|buckets| buckets.iter())
            .map(|bucket| bucket.entries.len())
            .sum();
        if total_entries == 0 {
            report.missing_manufacturer_pools.push(make.clone());
        }

        let total_buckets: usize = models.values().map(|buckets| buckets.len()).sum();
        if total_buckets == 0 {
            report.missing_year_bucket_models.push(make.clone());
        }

        for (model, buckets) in models {
            if buckets.is_empty() {
                report
                    .missing_model_year_mappings
                    .push(format!("{make}/{model}"));
            }

            // Overlapping spans under one model are a data-quality defect,
            // never silently merged.
            for (i, a) in buckets.iter().enumerate() {
                for b in buckets.iter().skip(i + 1) {
                    if a.span.overlaps(&b.span) {
                        report.overlapping_buckets.push(format!(
                            "{make}/{model}: {} overlaps {}",
                            a.span, b.span
                        ));
                    }
                }
            }

            for bucket in buckets {
                let bucket_id = format!("{make}/{model}/{}", bucket.span);

                // Exact post-trim textual duplicates: a stricter check than
                // the semantic collapse key, aimed at copy-paste errors.
                let mut label_counts: BTreeMap<&str, usize> = BTreeMap::new();
                for entry in &bucket.entries {
                    *label_counts.entry(entry.display_label.trim()).or_insert(0) += 1;
                }
                let dup_labels: Vec<String> = label_counts
                    .into_iter()
                    .filter(|(_, n)| *n > 1)
                    .map(|(label, _)| label.to_string())
                    .collect();
                if !dup_labels.is_empty() {
                    report
                        .duplicate_entries_by_bucket
                        .insert(bucket_id.clone(), dup_labels);
                }

                // Duplicate collapse keys surviving dedupe violate the
                // bucket uniqueness invariant.
                let mut key_counts: BTreeMap<&str, usize> = BTreeMap::new();
                for entry in &bucket.entries {
                    *key_counts.entry(entry.normalized_key.as_str()).or_insert(0) += 1;
                }
                let dup_keys: Vec<String> = key_counts
                    .into_iter()
                    .filter(|(_, n)| *n > 1)
                    .map(|(key, _)| key.to_string())
                    .collect();
                if !dup_keys.is_empty() {
                    report.duplicate_keys_by_bucket.insert(bucket_id, dup_keys);
                }
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CanonicalDb;

    #[test]
    fn clean_table_reports_nothing() {
        let db = CanonicalDb::from_json(
            r#"{
            "volkswagen": {"golf": {
                "2009-2012": ["1.6 TDI - 105hp"],
                "2013-2016": ["2.0 TDI - 150hp"]
            }}
        }"#,
        )
        .unwrap();
        let report = analyze(&db);
        assert_eq!(report.makes, 1);
        assert!(report.missing_manufacturer_pools.is_empty());
        assert!(report.missing_year_bucket_models.is_empty());
        assert!(report.missing_model_year_mappings.is_empty());
        assert!(report.duplicate_entries_by_bucket.is_empty());
        assert!(report.overlapping_buckets.is_empty());
        assert!(report.duplicate_keys_by_bucket.is_empty());
    }

    #[test]
    fn empty_pool_and_missing_buckets_flagged() {
        let db = CanonicalDb::from_json(r#"{"lancia": {"delta": {}}}"#).unwrap();
        let report = analyze(&db);
        assert_eq!(report.missing_manufacturer_pools, vec!["lancia"]);
        assert_eq!(report.missing_year_bucket_models, vec!["lancia"]);
        assert_eq!(report.missing_model_year_mappings, vec!["lancia/delta"]);
    }

    #[test]
    fn empty_bucket_is_not_a_missing_mapping() {
        // The model has a year mapping; its bucket is merely empty.
        let db = CanonicalDb::from_json(r#"{"lancia": {"delta": {"2008-2014": []}}}"#).unwrap();
        let report = analyze(&db);
        assert_eq!(report.missing_manufacturer_pools, vec!["lancia"]);
        assert!(report.missing_year_bucket_models.is_empty());
        assert!(report.missing_model_year_mappings.is_empty());
    }

    #[test]
    fn exact_textual_duplicates_flagged() {
        let db = CanonicalDb::from_json(
            r#"{
            "fiat": {"punto": {
                "2009-2012": ["1.4 T-Jet - 155hp", "1.4 T-Jet - 155hp "]
            }}
        }"#,
        )
        .unwrap();
        let report = analyze(&db);
        let dups = &report.duplicate_entries_by_bucket["fiat/punto/2009-2012"];
        assert_eq!(dups, &vec!["1.4 T-Jet - 155hp".to_string()]);
    }

    #[test]
    fn case_variants_are_not_textual_duplicates_but_share_a_key() {
        let db = CanonicalDb::from_json(
            r#"{
            "fiat": {"punto": {
                "2009-2012": ["1.4 T-Jet - 155hp", "1.4 t-jet - 155HP"]
            }}
        }"#,
        )
        .unwrap();
        let report = analyze(&db);
        assert!(report.duplicate_entries_by_bucket.is_empty());
        let keys = &report.duplicate_keys_by_bucket["fiat/punto/2009-2012"];
        assert_eq!(keys, &vec!["petrol-1.4-155".to_string()]);
    }

    #[test]
    fn overlapping_buckets_flagged_never_merged() {
        let db = CanonicalDb::from_json(
            r#"{
            "fiat": {"punto": {
                "2009-2012": ["1.4 T-Jet - 155hp"],
                "2012-2015": ["1.4 MultiJet - 95hp"]
            }}
        }"#,
        )
        .unwrap();
        let report = analyze(&db);
        assert_eq!(
            report.overlapping_buckets,
            vec!["fiat/punto: 2009-2012 overlaps 2012-2015"]
        );
        // Both buckets still present, untouched.
        assert_eq!(db.makes["fiat"]["punto"].len(), 2);
    }
}
