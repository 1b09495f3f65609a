use serde::Deserialize;

use crate::error::ReconError;
use crate::parser;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Pipeline tuning. Every field has a default equal to the shipped policy,
/// so an empty TOML document is a valid config.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Acceptance is strictly greater-than this score.
    #[serde(default = "default_threshold")]
    pub match_threshold: u8,
    #[serde(default)]
    pub tolerance: MatchTolerance,
}

fn default_name() -> String {
    "engine reconciliation".to_string()
}

fn default_threshold() -> u8 {
    65
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            match_threshold: default_threshold(),
            tolerance: MatchTolerance::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tolerances
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MatchTolerance {
    /// Capacity band awarding full points.
    #[serde(default = "default_capacity_tight")]
    pub capacity_tight_liters: f64,
    /// Capacity band awarding partial points.
    #[serde(default = "default_capacity_loose")]
    pub capacity_loose_liters: f64,
    /// Power tolerance as a fraction of candidate power.
    #[serde(default = "default_power_pct")]
    pub power_pct: f64,
    /// Absolute power tolerance floor in hp.
    #[serde(default = "default_power_floor")]
    pub power_floor_hp: u32,
}

fn default_capacity_tight() -> f64 {
    0.05
}

fn default_capacity_loose() -> f64 {
    0.10
}

fn default_power_pct() -> f64 {
    0.03
}

fn default_power_floor() -> u32 {
    3
}

impl Default for MatchTolerance {
    fn default() -> Self {
        Self {
            capacity_tight_liters: default_capacity_tight(),
            capacity_loose_liters: default_capacity_loose(),
            power_pct: default_power_pct(),
            power_floor_hp: default_power_floor(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl PipelineConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: PipelineConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.match_threshold >= 100 {
            return Err(ReconError::ConfigValidation(format!(
                "match_threshold must be below 100, got {}",
                self.match_threshold
            )));
        }

        let t = &self.tolerance;
        if !t.capacity_tight_liters.is_finite() || t.capacity_tight_liters < 0.0 {
            return Err(ReconError::ConfigValidation(
                "capacity_tight_liters must be a non-negative number".into(),
            ));
        }
        if !t.capacity_loose_liters.is_finite()
            || t.capacity_loose_liters < t.capacity_tight_liters
        {
            return Err(ReconError::ConfigValidation(
                "capacity_loose_liters must be at least capacity_tight_liters".into(),
            ));
        }
        if !t.power_pct.is_finite() || t.power_pct < 0.0 {
            return Err(ReconError::ConfigValidation(
                "power_pct must be a non-negative fraction".into(),
            ));
        }

        // The fuel keyword lists are compile-time constants, but their
        // disjointness is a correctness invariant of classification, not an
        // implicit ordering assumption. Check it wherever a config is built.
        if !parser::fuel_keyword_sets_are_disjoint() {
            return Err(ReconError::ConfigValidation(
                "fuel keyword sets overlap; classification order would decide fuel kind".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
