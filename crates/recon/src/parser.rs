//! Free-text engine label parsing.
//!
//! `parse` is pure and total: unrecognized text yields `None`/`Unknown`
//! fields, never an error. All pattern matching for labels lives here; the
//! orchestrator only ever sees `ParsedAttributes`.

use std::collections::BTreeSet;

use regex::Regex;

use crate::model::{FuelKind, ParsedAttributes};

// Fuel classification keyword sets. Checked in priority order diesel →
// petrol → hybrid → electric; the sets must stay pairwise disjoint so the
// order never decides between two kinds (`fuel_keyword_sets_are_disjoint`
// is enforced by config validation and by unit test).
pub const DIESEL_KEYWORDS: &[&str] = &[
    "diesel", "tdi", "cdi", "crdi", "hdi", "dci", "jtd", "tdci", "multijet", "bluetec", "d-4d",
];
pub const PETROL_KEYWORDS: &[&str] = &[
    "petrol", "gasoline", "tsi", "tfsi", "fsi", "gdi", "mpi", "vti", "tce", "t-jet", "ecoboost",
    "vvt-i",
];
pub const HYBRID_KEYWORDS: &[&str] = &["hybrid", "phev", "hev", "plug-in"];
pub const ELECTRIC_KEYWORDS: &[&str] = &["electric", "ev", "bev", "e-tron"];

/// Fixed vocabulary for type tags: fuel-system and engine-family tokens.
/// Matched as lowercase substrings; a label may carry several tags.
pub const TYPE_TAG_VOCAB: &[&str] = &[
    "tdi", "cdi", "crdi", "hdi", "dci", "jtd", "tdci", "multijet", "common rail", "common-rail",
    "tsi", "tfsi", "fsi", "gdi", "mpi", "tce", "t-jet", "ecoboost", "turbo",
];

/// Parse one free-text label into structured attributes.
pub fn parse(label: &str) -> ParsedAttributes {
    let lower = label.to_lowercase();
    ParsedAttributes {
        capacity_liters: parse_capacity(&lower),
        power_hp: parse_power(&lower),
        fuel_kind: classify_fuel(&lower),
        type_tags: collect_tags(&lower),
    }
}

/// Capacity: a `D.D` decimal, preferring a candidate adjacent to a liter
/// marker when more than one decimal token is present.
fn parse_capacity(lower: &str) -> Option<f64> {
    let marked = Regex::new(r"(\d\.\d)\s*(?:l|litre|liter)\b").unwrap();
    if let Some(caps) = marked.captures(lower) {
        return caps[1].parse().ok();
    }
    let bare = Regex::new(r"\d\.\d").unwrap();
    bare.find(lower).and_then(|m| m.as_str().parse().ok())
}

/// Power: an integer immediately followed by a power-unit token.
fn parse_power(lower: &str) -> Option<u32> {
    let re = Regex::new(r"(\d{2,4})\s*(?:hp|ps|kw)\b").unwrap();
    re.captures(lower).and_then(|caps| caps[1].parse().ok())
}

/// Split a lowercased label into bare tokens, trimming edge punctuation but
/// keeping internal hyphens (`t-jet`, `plug-in`).
fn tokens(lower: &str) -> Vec<&str> {
    lower
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .collect()
}

fn classify_fuel(lower: &str) -> FuelKind {
    let toks = tokens(lower);
    let has = |set: &[&str]| toks.iter().any(|t| set.contains(t));
    if has(DIESEL_KEYWORDS) {
        FuelKind::Diesel
    } else if has(PETROL_KEYWORDS) {
        FuelKind::Petrol
    } else if has(HYBRID_KEYWORDS) {
        FuelKind::Hybrid
    } else if has(ELECTRIC_KEYWORDS) {
        FuelKind::Electric
    } else {
        FuelKind::Unknown
    }
}

fn collect_tags(lower: &str) -> BTreeSet<String> {
    TYPE_TAG_VOCAB
        .iter()
        .filter(|tag| lower.contains(*tag))
        .map(|tag| tag.to_string())
        .collect()
}

/// True when no keyword string belongs to two fuel kinds.
pub fn fuel_keyword_sets_are_disjoint() -> bool {
    let sets = [
        DIESEL_KEYWORDS,
        PETROL_KEYWORDS,
        HYBRID_KEYWORDS,
        ELECTRIC_KEYWORDS,
    ];
    for (i, a) in sets.iter().enumerate() {
        for b in sets.iter().skip(i + 1) {
            if a.iter().any(|k| b.contains(k)) {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_plain_decimal() {
        assert_eq!(parse("1.6 TDI - 105hp").capacity_liters, Some(1.6));
    }

    #[test]
    fn capacity_prefers_liter_marker() {
        // Two decimal tokens; the one with a liter marker wins.
        let attrs = parse("v2.0 trim 1.8L turbo");
        assert_eq!(attrs.capacity_liters, Some(1.8));
    }

    #[test]
    fn capacity_first_decimal_without_marker() {
        let attrs = parse("2.0 bi-turbo 1.9 trim");
        assert_eq!(attrs.capacity_liters, Some(2.0));
    }

    #[test]
    fn capacity_absent() {
        assert_eq!(parse("Electric 204hp").capacity_liters, None);
    }

    #[test]
    fn power_units() {
        assert_eq!(parse("1.6 TDI - 105hp").power_hp, Some(105));
        assert_eq!(parse("2.0 TSI 190 PS").power_hp, Some(190));
        assert_eq!(parse("e-drive 150kW").power_hp, Some(150));
    }

    #[test]
    fn power_absent_without_unit() {
        // A bare integer is not a power figure.
        assert_eq!(parse("1.4 MultiJet 95").power_hp, None);
    }

    #[test]
    fn fuel_classification() {
        assert_eq!(parse("1.6 TDI - 105hp").fuel_kind, FuelKind::Diesel);
        assert_eq!(parse("1.4 T-Jet - 155hp").fuel_kind, FuelKind::Petrol);
        assert_eq!(parse("2.5 Hybrid 218hp").fuel_kind, FuelKind::Hybrid);
        assert_eq!(parse("EV 204hp").fuel_kind, FuelKind::Electric);
        assert_eq!(parse("1.8 16v").fuel_kind, FuelKind::Unknown);
    }

    #[test]
    fn fuel_keywords_match_whole_tokens_only() {
        // "level" contains "ev" but is not an electric marker.
        assert_eq!(parse("2.0 level trim").fuel_kind, FuelKind::Unknown);
    }

    #[test]
    fn diesel_beats_petrol_marker_order() {
        // Contains both a petrol and a diesel family token; diesel wins.
        assert_eq!(parse("1.6 TDI (TSI chassis)").fuel_kind, FuelKind::Diesel);
    }

    #[test]
    fn type_tags_keep_all_matches() {
        let attrs = parse("1.5 TDCi common rail");
        assert!(attrs.type_tags.contains("tdci"));
        assert!(attrs.type_tags.contains("common rail"));
        // "dci" is a substring of "tdci"; substring tags keep both.
        assert!(attrs.type_tags.contains("dci"));
    }

    #[test]
    fn type_tags_empty_for_unrecognized() {
        assert!(parse("plain label").type_tags.is_empty());
        assert!(parse("3.0 V6 24v").type_tags.is_empty());
    }

    #[test]
    fn keyword_sets_disjoint() {
        assert!(fuel_keyword_sets_are_disjoint());
    }

    #[test]
    fn parse_is_total_on_junk() {
        let attrs = parse("?!@# 0. .5 hp kw");
        assert_eq!(attrs.capacity_liters, None);
        assert_eq!(attrs.power_hp, None);
        assert_eq!(attrs.fuel_kind, FuelKind::Unknown);
    }
}
