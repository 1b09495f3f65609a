//! Canonical table snapshot codec.
//!
//! Wire contract: manufacturer-slug → model-slug → `"YYYY-YYYY"` → ordered
//! engine label list. The serving layer reads exactly this structure; the
//! pipeline reads it at start and writes a fully materialized copy at end.

use std::collections::BTreeMap;

use crate::error::ReconError;
use crate::model::{CanonicalDb, CanonicalEntry, YearBucket, YearSpan};

type SnapshotMap = BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<String>>>>;

impl CanonicalDb {
    /// Parse a snapshot document. Labels are kept verbatim as display text;
    /// collapse keys are derived on load.
    pub fn from_json(input: &str) -> Result<Self, ReconError> {
        let raw: SnapshotMap =
            serde_json::from_str(input).map_err(|e| ReconError::SnapshotParse(e.to_string()))?;

        let mut db = CanonicalDb::default();
        for (make, models) in raw {
            let mut model_map = BTreeMap::new();
            for (model, ranges) in models {
                let mut buckets = Vec::with_capacity(ranges.len());
                for (range, labels) in ranges {
                    let span =
                        YearSpan::parse(&range).ok_or_else(|| ReconError::YearSpanParse {
                            context: format!("{make}/{model}"),
                            value: range.clone(),
                        })?;
                    buckets.push(YearBucket {
                        span,
                        entries: labels
                            .iter()
                            .map(|l| CanonicalEntry::from_label(l))
                            .collect(),
                    });
                }
                // Range keys sort lexically; keep buckets in year order.
                buckets.sort_by_key(|b| b.span);
                model_map.insert(model, buckets);
            }
            db.makes.insert(make, model_map);
        }
        Ok(db)
    }

    /// Serialize back to the wire contract, deterministically ordered.
    pub fn to_json(&self) -> Result<String, ReconError> {
        let mut raw: SnapshotMap = BTreeMap::new();
        for (make, models) in &self.makes {
            let mut model_map = BTreeMap::new();
            for (model, buckets) in models {
                let mut ranges = BTreeMap::new();
                for bucket in buckets {
                    ranges.insert(
                        bucket.span.to_string(),
                        bucket
                            .entries
                            .iter()
                            .map(|e| e.display_label.clone())
                            .collect::<Vec<_>>(),
                    );
                }
                model_map.insert(model.clone(), ranges);
            }
            raw.insert(make.clone(), model_map);
        }
        serde_json::to_string_pretty(&raw).map_err(|e| ReconError::Serialize(e.to_string()))
    }
}
