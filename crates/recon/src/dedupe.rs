//! Semantic deduplication of canonical entries within one year bucket.
//!
//! Collapse key: `fuelKind-capacityBucket-roundedPower`. Order-preserving,
//! first occurrence wins, and the survivor keeps its exact display text.

use std::collections::BTreeSet;

use crate::model::{CanonicalEntry, FuelKind};
use crate::parser;

/// Derive the collapse key for one display label.
///
/// Power is rounded to the nearest multiple of 5 so near-identical power
/// figures (155 vs 157) collapse. A common-rail qualifier promotes diesel
/// to a distinct `diesel-cr` bucket: pre- and post- common-rail variants of
/// the same displacement are never merged.
pub fn normalized_key(label: &str) -> String {
    let attrs = parser::parse(label);
    let lower = label.to_lowercase();

    let fuel = if attrs.fuel_kind == FuelKind::Diesel
        && (lower.contains("common rail") || lower.contains("common-rail"))
    {
        "diesel-cr".to_string()
    } else {
        attrs.fuel_kind.to_string()
    };

    let capacity = attrs
        .capacity_liters
        .map(|c| format!("{c:.1}"))
        .unwrap_or_else(|| "unknown".to_string());

    let power = attrs
        .power_hp
        .map(|p| round_to_five(p).to_string())
        .unwrap_or_else(|| "unknown".to_string());

    format!("{fuel}-{capacity}-{power}")
}

fn round_to_five(power: u32) -> u32 {
    ((power + 2) / 5) * 5
}

/// Collapse a bucket's entry list to one entry per collapse key.
pub fn dedupe(entries: &[CanonicalEntry]) -> Vec<CanonicalEntry> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        if seen.insert(entry.normalized_key.as_str()) {
            out.push(entry.clone());
        }
    }
    out
}
