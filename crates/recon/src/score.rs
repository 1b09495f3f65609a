//! Multi-factor similarity scoring between an incoming variant and one
//! candidate canonical entry.
//!
//! Weighted, additive, capped at 100. Capacity and power are the most
//! discriminating attributes and carry equal top weight; fuel kind and tag
//! overlap only corroborate. A fuel-kind-only match (20) can never cross
//! the acceptance threshold on its own.

use crate::config::MatchTolerance;
use crate::model::{FuelKind, ParsedAttributes};
use crate::parser;

pub const W_CAPACITY_TIGHT: u32 = 40;
pub const W_CAPACITY_LOOSE: u32 = 25;
pub const W_POWER_TIGHT: u32 = 40;
pub const W_POWER_LOOSE: u32 = 15;
pub const W_FUEL: u32 = 20;
pub const W_TAG_OVERLAP: u32 = 10;

// Guards float comparison at the tolerance edge (0.05 is not exact in f64).
const EPS: f64 = 1e-9;

/// Score an incoming variant against one candidate, both pre-parsed.
pub fn score(incoming: &ParsedAttributes, candidate: &ParsedAttributes, tol: &MatchTolerance) -> u8 {
    let mut total: u32 = 0;

    if let (Some(a), Some(b)) = (incoming.capacity_liters, candidate.capacity_liters) {
        let diff = (a - b).abs();
        if diff <= tol.capacity_tight_liters + EPS {
            total += W_CAPACITY_TIGHT;
        } else if diff <= tol.capacity_loose_liters + EPS {
            total += W_CAPACITY_LOOSE;
        }
    }

    if let (Some(p), Some(c)) = (incoming.power_hp, candidate.power_hp) {
        let tolerance = (f64::from(c) * tol.power_pct).max(f64::from(tol.power_floor_hp));
        let diff = (f64::from(p) - f64::from(c)).abs();
        if diff <= tolerance + EPS {
            total += W_POWER_TIGHT;
        } else if diff <= 1.5 * tolerance + EPS {
            total += W_POWER_LOOSE;
        }
    }

    if incoming.fuel_kind != FuelKind::Unknown
        && candidate.fuel_kind != FuelKind::Unknown
        && incoming.fuel_kind == candidate.fuel_kind
    {
        total += W_FUEL;
    }

    if !incoming.type_tags.is_disjoint(&candidate.type_tags) {
        total += W_TAG_OVERLAP;
    }

    total.min(100) as u8
}

/// Score against a raw candidate label, parsing it first.
pub fn score_label(incoming: &ParsedAttributes, candidate_label: &str, tol: &MatchTolerance) -> u8 {
    score(incoming, &parser::parse(candidate_label), tol)
}

/// Acceptance is strictly above the threshold: a score equal to the
/// threshold is not a match.
pub fn is_match(score: u8, threshold: u8) -> bool {
    score > threshold
}
