//! Reconciliation orchestrator.
//!
//! Walks every incoming variant, places it into the overlapping year
//! buckets of its (make, model), and either accepts it as already
//! represented or inserts a new canonical entry. Pure over its inputs: the
//! canonical table is cloned, never mutated in place.

use std::collections::BTreeMap;

use crate::canon::canonicalize;
use crate::config::PipelineConfig;
use crate::dedupe::dedupe;
use crate::model::{
    slugify, CanonicalDb, CanonicalEntry, EngineVariant, MatchResult, MergeReport,
    ParsedAttributes, UnmatchedReason, UnmatchedRow, YearBucket,
};
use crate::parser;
use crate::score::{is_match, score_label};

/// Reconcile incoming variants against a canonical table. Returns the new
/// table plus the merge report; the input table is left untouched.
///
/// The pipeline never invents structure: a variant whose make, model, or
/// year coverage is absent is recorded as unmatched and skipped.
pub fn reconcile(
    canonical: &CanonicalDb,
    incoming: &[EngineVariant],
    config: &PipelineConfig,
) -> (CanonicalDb, MergeReport) {
    let mut db = canonical.clone();
    let mut report = MergeReport {
        makes_processed: db.makes.len(),
        models_processed: db.makes.values().map(|models| models.len()).sum(),
        ..Default::default()
    };

    // New entries are staged per bucket and appended after the scoring
    // pass, so an insertion from this run never becomes a scoring candidate
    // for a later variant in the same run.
    let mut staged: BTreeMap<(String, String, usize), Vec<CanonicalEntry>> = BTreeMap::new();

    for variant in incoming {
        let make_slug = slugify(&variant.manufacturer);
        let model_slug = slugify(&variant.model);

        let Some(models) = db.makes.get(&make_slug) else {
            report.unmatched.push(UnmatchedRow {
                variant: variant.clone(),
                reason: UnmatchedReason::MissingMake,
            });
            continue;
        };
        let Some(buckets) = models.get(&model_slug) else {
            report.unmatched.push(UnmatchedRow {
                variant: variant.clone(),
                reason: UnmatchedReason::MissingModel,
            });
            continue;
        };

        let display = canonicalize(&variant.engine_label);
        let attrs = parser::parse(&display);

        // A variant spanning two published ranges is legitimately present
        // in both; every overlapping bucket is evaluated independently.
        let mut placed = false;
        for (idx, bucket) in buckets.iter().enumerate() {
            if !bucket.span.overlaps(&variant.year_span) {
                continue;
            }
            placed = true;

            let result = best_match(bucket, &attrs, config);
            let detail = report.per_make_detail.entry(make_slug.clone()).or_default();
            if is_match(result.score, config.match_threshold) {
                report.engines_matched += 1;
                detail.matched += 1;
            } else {
                staged
                    .entry((make_slug.clone(), model_slug.clone(), idx))
                    .or_default()
                    .push(CanonicalEntry::from_label(&display));
                report.engines_added += 1;
                detail.added += 1;
            }
        }

        if !placed {
            report.unmatched.push(UnmatchedRow {
                variant: variant.clone(),
                reason: UnmatchedReason::MissingYearCoverage,
            });
        }
    }

    // Append staged insertions, then collapse each touched bucket.
    for ((make, model, idx), new_entries) in staged {
        if let Some(bucket) = db
            .makes
            .get_mut(&make)
            .and_then(|models| models.get_mut(&model))
            .and_then(|buckets| buckets.get_mut(idx))
        {
            bucket.entries.extend(new_entries);
            bucket.entries = dedupe(&bucket.entries);
        }
    }

    // Whole-table safety net, independent of the per-bucket calls above.
    dedupe_database(&mut db);

    (db, report)
}

/// Re-collapse every bucket in the table. Idempotent.
pub fn dedupe_database(db: &mut CanonicalDb) {
    for models in db.makes.values_mut() {
        for buckets in models.values_mut() {
            for bucket in buckets {
                bucket.entries = dedupe(&bucket.entries);
            }
        }
    }
}

/// Best-scoring existing entry of one bucket for the given attributes.
pub fn best_match(
    bucket: &YearBucket,
    attrs: &ParsedAttributes,
    config: &PipelineConfig,
) -> MatchResult {
    let mut best = MatchResult {
        score: 0,
        candidate: None,
    };
    for entry in &bucket.entries {
        let score = score_label(attrs, &entry.display_label, &config.tolerance);
        if best.candidate.is_none() || score > best.score {
            best = MatchResult {
                score,
                candidate: Some(entry.clone()),
            };
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::IncomingRows;
    use crate::model::YearSpan;

    const SNAPSHOT: &str = r#"{
        "volkswagen": {
            "golf": {
                "2013-2016": ["1.6 TDI - 116hp"]
            }
        },
        "fiat": {
            "punto": {
                "2009-2012": []
            }
        }
    }"#;

    fn variant(make: &str, model: &str, span: (i32, i32), label: &str) -> EngineVariant {
        EngineVariant {
            manufacturer: make.to_string(),
            model: model.to_string(),
            generation: None,
            year_span: YearSpan::new(span.0, span.1),
            engine_label: label.to_string(),
            displacement_liters: None,
            fuel_kind: None,
            power_hp: None,
            torque_nm: None,
        }
    }

    fn db() -> CanonicalDb {
        CanonicalDb::from_json(SNAPSHOT).unwrap()
    }

    fn config() -> PipelineConfig {
        PipelineConfig::default()
    }

    #[test]
    fn close_variant_matches_no_insert() {
        // capacity within 0.05, power diff 1, fuel equal → 100 → match
        let rows = vec![variant("Volkswagen", "Golf", (2014, 2015), "1.6 TDI 115hp")];
        let (out, report) = reconcile(&db(), &rows, &config());
        assert_eq!(report.engines_matched, 1);
        assert_eq!(report.engines_added, 0);
        assert_eq!(out.makes["volkswagen"]["golf"][0].entries.len(), 1);
    }

    #[test]
    fn distant_variant_inserted_canonicalized() {
        let rows = vec![variant("Volkswagen", "Golf", (2014, 2015), "2.0 tdi 150hp")];
        let (out, report) = reconcile(&db(), &rows, &config());
        assert_eq!(report.engines_added, 1);
        assert_eq!(report.engines_matched, 0);
        let entries = &out.makes["volkswagen"]["golf"][0].entries;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].display_label, "2.0 TDI - 150hp");
    }

    #[test]
    fn near_twins_inserted_then_collapsed() {
        // Empty bucket: neither has an existing candidate to score against;
        // both are inserted, then the deduplicator collapses them.
        let rows = vec![
            variant("Fiat", "Punto", (2010, 2011), "1.4 T-Jet - 155hp"),
            variant("Fiat", "Punto", (2010, 2011), "1.4 T-Jet - 157hp"),
        ];
        let (out, report) = reconcile(&db(), &rows, &config());
        assert_eq!(report.engines_added, 2);
        let entries = &out.makes["fiat"]["punto"][0].entries;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].display_label, "1.4 T-Jet - 155hp");
    }

    #[test]
    fn missing_make_recorded_not_invented() {
        let rows = vec![variant("Dacia", "Sandero", (2015, 2018), "1.5 dCi 90hp")];
        let (out, report) = reconcile(&db(), &rows, &config());
        assert_eq!(report.unmatched.len(), 1);
        assert_eq!(report.unmatched[0].reason, UnmatchedReason::MissingMake);
        assert!(!out.makes.contains_key("dacia"));
    }

    #[test]
    fn missing_model_recorded() {
        let rows = vec![variant("Volkswagen", "Passat", (2014, 2015), "2.0 TDI 150hp")];
        let (_, report) = reconcile(&db(), &rows, &config());
        assert_eq!(report.unmatched[0].reason, UnmatchedReason::MissingModel);
    }

    #[test]
    fn missing_year_coverage_recorded() {
        let rows = vec![variant("Volkswagen", "Golf", (2020, 2023), "1.5 TSI 130hp")];
        let (out, report) = reconcile(&db(), &rows, &config());
        assert_eq!(report.unmatched[0].reason, UnmatchedReason::MissingYearCoverage);
        // No new bucket was created for 2020-2023.
        assert_eq!(out.makes["volkswagen"]["golf"].len(), 1);
    }

    #[test]
    fn variant_spanning_two_buckets_placed_in_both() {
        let snapshot = r#"{
            "volkswagen": {"golf": {
                "2009-2012": [],
                "2013-2016": []
            }}
        }"#;
        let db = CanonicalDb::from_json(snapshot).unwrap();
        let rows = vec![variant("Volkswagen", "Golf", (2012, 2013), "1.6 TDI 105hp")];
        let (out, report) = reconcile(&db, &rows, &config());
        assert_eq!(report.engines_added, 2);
        let buckets = &out.makes["volkswagen"]["golf"];
        assert_eq!(buckets[0].entries.len(), 1);
        assert_eq!(buckets[1].entries.len(), 1);
    }

    #[test]
    fn input_database_is_not_mutated() {
        let original = db();
        let before = original.to_json().unwrap();
        let rows = vec![variant("Volkswagen", "Golf", (2014, 2015), "2.0 TDI 150hp")];
        let (_, _) = reconcile(&original, &rows, &config());
        assert_eq!(original.to_json().unwrap(), before);
    }

    #[test]
    fn reconcile_is_deterministic() {
        let rows = vec![
            variant("Volkswagen", "Golf", (2014, 2015), "2.0 TDI 150hp"),
            variant("Fiat", "Punto", (2010, 2011), "1.4 T-Jet 155hp"),
            variant("Nash", "Metropolitan", (1954, 1961), "1.2 straight-4"),
        ];
        let (out_a, report_a) = reconcile(&db(), &rows, &config());
        let (out_b, report_b) = reconcile(&db(), &rows, &config());
        assert_eq!(out_a.to_json().unwrap(), out_b.to_json().unwrap());
        assert_eq!(
            serde_json::to_string(&report_a).unwrap(),
            serde_json::to_string(&report_b).unwrap()
        );
    }

    #[test]
    fn per_make_detail_counts() {
        let rows = vec![
            variant("Volkswagen", "Golf", (2014, 2015), "1.6 TDI 115hp"),
            variant("Volkswagen", "Golf", (2014, 2015), "2.0 TDI 150hp"),
            variant("Fiat", "Punto", (2010, 2011), "1.4 T-Jet 155hp"),
        ];
        let (_, report) = reconcile(&db(), &rows, &config());
        assert_eq!(report.per_make_detail["volkswagen"].matched, 1);
        assert_eq!(report.per_make_detail["volkswagen"].added, 1);
        assert_eq!(report.per_make_detail["fiat"].added, 1);
        assert_eq!(report.makes_processed, 2);
        assert_eq!(report.models_processed, 2);
    }

    #[test]
    fn grouped_rows_reconcile_like_flat_rows() {
        let grouped = r#"{
            "volkswagen": {"golf": {"variants": [
                {"engineLabel": "2.0 TDI 150hp", "yearSpan": "2014-2015"}
            ]}}
        }"#;
        let flat = r#"[
            {"manufacturer": "volkswagen", "model": "golf",
             "yearSpan": "2014-2015", "engineLabel": "2.0 TDI 150hp"}
        ]"#;
        let rows_g = IncomingRows::from_json(grouped).unwrap().normalize();
        let rows_f = IncomingRows::from_json(flat).unwrap().normalize();
        let (out_g, _) = reconcile(&db(), &rows_g.variants, &config());
        let (out_f, _) = reconcile(&db(), &rows_f.variants, &config());
        assert_eq!(out_g.to_json().unwrap(), out_f.to_json().unwrap());
    }
}
