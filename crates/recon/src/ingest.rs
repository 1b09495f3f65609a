//! Ingestion boundary for incoming rows.
//!
//! Rows arrive in two published shapes: a flat record list or a pre-grouped
//! manufacturer → model map. Both normalize into one internal
//! `EngineVariant` stream here, so no format branching leaks into the
//! scoring or parsing logic.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ReconError;
use crate::model::{EngineVariant, FuelKind, YearSpan};

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

/// One record of the flat list shape. Year span and label stay raw strings
/// here: a bad value in one row must skip that row, not fail the document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatRow {
    pub manufacturer: String,
    pub model: String,
    #[serde(default, alias = "modelGeneration")]
    pub generation: Option<String>,
    #[serde(default)]
    pub year_span: Option<String>,
    #[serde(default)]
    pub engine_label: Option<String>,
    #[serde(default, alias = "displacementLiters")]
    pub displacement: Option<f64>,
    #[serde(default)]
    pub fuel_kind: Option<FuelKind>,
    #[serde(default)]
    pub power_hp: Option<u32>,
    #[serde(default)]
    pub torque_nm: Option<u32>,
}

/// One variant of the pre-grouped shape; make and model come from the
/// surrounding map keys.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedVariant {
    #[serde(default)]
    pub engine_label: Option<String>,
    #[serde(default, alias = "modelGeneration")]
    pub generation: Option<String>,
    #[serde(default)]
    pub year_span: Option<String>,
    #[serde(default, alias = "displacementLiters")]
    pub displacement: Option<f64>,
    #[serde(default)]
    pub fuel_kind: Option<FuelKind>,
    #[serde(default)]
    pub power_hp: Option<u32>,
    #[serde(default)]
    pub torque_nm: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupedModel {
    pub variants: Vec<GroupedVariant>,
}

/// Tagged sum over the two published row shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum IncomingRows {
    Flat(Vec<FlatRow>),
    Grouped(BTreeMap<String, BTreeMap<String, GroupedModel>>),
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct NormalizedRows {
    pub variants: Vec<EngineVariant>,
    /// Rows dropped for a missing label or unparsable year span.
    pub malformed: usize,
}

impl IncomingRows {
    pub fn from_json(input: &str) -> Result<Self, ReconError> {
        serde_json::from_str(input).map_err(|e| ReconError::RowsParse(e.to_string()))
    }

    /// Collapse either shape into the single internal representation.
    pub fn normalize(self) -> NormalizedRows {
        let mut out = NormalizedRows::default();
        match self {
            Self::Flat(rows) => {
                for row in rows {
                    push_variant(
                        &mut out,
                        row.manufacturer,
                        row.model,
                        row.generation,
                        row.year_span,
                        row.engine_label,
                        row.displacement,
                        row.fuel_kind,
                        row.power_hp,
                        row.torque_nm,
                    );
                }
            }
            Self::Grouped(makes) => {
                for (make, models) in makes {
                    for (model, group) in models {
                        for v in group.variants {
                            push_variant(
                                &mut out,
                                make.clone(),
                                model.clone(),
                                v.generation,
                                v.year_span,
                                v.engine_label,
                                v.displacement,
                                v.fuel_kind,
                                v.power_hp,
                                v.torque_nm,
                            );
                        }
                    }
                }
            }
        }
        out
    }
}

#[allow(clippy::too_many_arguments)]
fn push_variant(
    out: &mut NormalizedRows,
    manufacturer: String,
    model: String,
    generation: Option<String>,
    year_span: Option<String>,
    engine_label: Option<String>,
    displacement: Option<f64>,
    fuel_kind: Option<FuelKind>,
    power_hp: Option<u32>,
    torque_nm: Option<u32>,
) {
    let label = match engine_label {
        Some(l) if !l.trim().is_empty() => l,
        _ => {
            out.malformed += 1;
            return;
        }
    };
    let span = match year_span.as_deref().and_then(YearSpan::parse) {
        Some(s) => s,
        None => {
            out.malformed += 1;
            return;
        }
    };
    out.variants.push(EngineVariant {
        manufacturer,
        model,
        generation,
        year_span: span,
        engine_label: label,
        displacement_liters: displacement,
        fuel_kind,
        power_hp,
        torque_nm,
    });
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Load flat rows from CSV text. Required columns: manufacturer, model,
/// year_span, engine_label; the remaining contract fields are optional.
pub fn load_csv_rows(csv_data: &str) -> Result<Vec<FlatRow>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::RowsParse(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let idx = |name: &str| -> Result<usize, ReconError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ReconError::MissingColumn { column: name.into() })
    };
    let opt_idx = |name: &str| headers.iter().position(|h| h == name);

    let manufacturer_idx = idx("manufacturer")?;
    let model_idx = idx("model")?;
    let year_span_idx = idx("year_span")?;
    let engine_label_idx = idx("engine_label")?;
    let generation_idx = opt_idx("generation");
    let displacement_idx = opt_idx("displacement");
    let fuel_kind_idx = opt_idx("fuel_kind");
    let power_hp_idx = opt_idx("power_hp");
    let torque_nm_idx = opt_idx("torque_nm");

    let non_empty = |v: &str| {
        let t = v.trim();
        (!t.is_empty()).then(|| t.to_string())
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReconError::RowsParse(e.to_string()))?;
        let field = |i: usize| record.get(i).unwrap_or("");
        let opt_field = |i: Option<usize>| i.map(field).unwrap_or("");

        rows.push(FlatRow {
            manufacturer: field(manufacturer_idx).trim().to_string(),
            model: field(model_idx).trim().to_string(),
            generation: non_empty(opt_field(generation_idx)),
            year_span: non_empty(field(year_span_idx)),
            engine_label: non_empty(field(engine_label_idx)),
            displacement: opt_field(displacement_idx).trim().parse().ok(),
            fuel_kind: parse_fuel(opt_field(fuel_kind_idx)),
            power_hp: opt_field(power_hp_idx).trim().parse().ok(),
            torque_nm: opt_field(torque_nm_idx).trim().parse().ok(),
        });
    }

    Ok(rows)
}

fn parse_fuel(value: &str) -> Option<FuelKind> {
    match value.trim().to_lowercase().as_str() {
        "" => None,
        "petrol" | "gasoline" => Some(FuelKind::Petrol),
        "diesel" => Some(FuelKind::Diesel),
        "hybrid" => Some(FuelKind::Hybrid),
        "electric" => Some(FuelKind::Electric),
        _ => Some(FuelKind::Unknown),
    }
}
