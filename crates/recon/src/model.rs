use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Fuel kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelKind {
    Petrol,
    Diesel,
    Hybrid,
    Electric,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for FuelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Petrol => write!(f, "petrol"),
            Self::Diesel => write!(f, "diesel"),
            Self::Hybrid => write!(f, "hybrid"),
            Self::Electric => write!(f, "electric"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

// ---------------------------------------------------------------------------
// Year spans
// ---------------------------------------------------------------------------

/// Inclusive model-year range, e.g. `2013-2016`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearSpan {
    pub start: i32,
    pub end: i32,
}

impl YearSpan {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// Parse `"YYYY-YYYY"`. A bare `"YYYY"` is accepted as a one-year span.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        let (start, end) = match s.split_once('-') {
            Some((a, b)) => (a.trim().parse().ok()?, b.trim().parse().ok()?),
            None => {
                let y = s.parse().ok()?;
                (y, y)
            }
        };
        if start > end {
            return None;
        }
        Some(Self { start, end })
    }

    /// Inclusive-inclusive integer overlap test.
    pub fn overlaps(&self, other: &YearSpan) -> bool {
        !(other.end < self.start || other.start > self.end)
    }
}

impl fmt::Display for YearSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl Serialize for YearSpan {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for YearSpan {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        YearSpan::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid year span '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One normalized incoming row. Immutable once built by the ingestion layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineVariant {
    pub manufacturer: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<String>,
    pub year_span: YearSpan,
    pub engine_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub displacement_liters: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_kind: Option<FuelKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_hp: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torque_nm: Option<u32>,
}

/// Attributes extracted from one free-text engine label.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAttributes {
    pub capacity_liters: Option<f64>,
    pub power_hp: Option<u32>,
    pub fuel_kind: FuelKind,
    pub type_tags: BTreeSet<String>,
}

// ---------------------------------------------------------------------------
// Canonical table
// ---------------------------------------------------------------------------

/// Atomic unit stored inside a year bucket.
///
/// `normalized_key` is the dedupe/match identity; within one bucket the keys
/// are unique once the deduplicator has run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalEntry {
    pub display_label: String,
    pub normalized_key: String,
}

impl CanonicalEntry {
    /// Build an entry from its display label, deriving the collapse key.
    pub fn from_label(label: &str) -> Self {
        Self {
            display_label: label.to_string(),
            normalized_key: crate::dedupe::normalized_key(label),
        }
    }
}

/// Year bucket: inclusive year range plus its ordered engine list.
#[derive(Debug, Clone, Serialize)]
pub struct YearBucket {
    pub span: YearSpan,
    pub entries: Vec<CanonicalEntry>,
}

/// The authoritative manufacturer → model → year-bucket structure.
///
/// Reconciliation clones it and returns the clone; the input value is never
/// mutated in place.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CanonicalDb {
    pub makes: BTreeMap<String, BTreeMap<String, Vec<YearBucket>>>,
}

// ---------------------------------------------------------------------------
// Match result
// ---------------------------------------------------------------------------

/// Transient, produced per (variant, bucket) pair. Not persisted.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub score: u8,
    pub candidate: Option<CanonicalEntry>,
}

// ---------------------------------------------------------------------------
// Merge report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedReason {
    MissingMake,
    MissingModel,
    MissingYearCoverage,
}

impl fmt::Display for UnmatchedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingMake => write!(f, "missing make"),
            Self::MissingModel => write!(f, "missing model"),
            Self::MissingYearCoverage => write!(f, "missing year coverage"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedRow {
    #[serde(flatten)]
    pub variant: EngineVariant,
    pub reason: UnmatchedReason,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MakeDetail {
    pub added: usize,
    pub matched: usize,
}

/// Built incrementally during a reconciliation run; immutable once returned.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    pub makes_processed: usize,
    pub models_processed: usize,
    pub engines_added: usize,
    pub engines_matched: usize,
    pub per_make_detail: BTreeMap<String, MakeDetail>,
    pub unmatched: Vec<UnmatchedRow>,
    pub malformed_rows: usize,
}

// ---------------------------------------------------------------------------
// Coverage report
// ---------------------------------------------------------------------------

/// Produced independently from the canonical table only.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    pub makes: usize,
    pub missing_manufacturer_pools: Vec<String>,
    pub missing_year_bucket_models: Vec<String>,
    pub missing_model_year_mappings: Vec<String>,
    pub duplicate_entries_by_bucket: BTreeMap<String, Vec<String>>,
    pub overlapping_buckets: Vec<String>,
    pub duplicate_keys_by_bucket: BTreeMap<String, Vec<String>>,
}

// ---------------------------------------------------------------------------
// Slugs
// ---------------------------------------------------------------------------

/// Lowercase, punctuation-normalized slug: `"Alfa Romeo"` → `"alfa-romeo"`.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_sep = false;
    for c in input.trim().chars() {
        if c.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            for lc in c.to_lowercase() {
                out.push(lc);
            }
        } else {
            pending_sep = true;
        }
    }
    out
}
