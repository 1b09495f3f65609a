//! `motordex-recon` — vehicle-engine catalog reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded snapshots and rows, returns a new
//! canonical table plus reports. No CLI or file I/O dependencies.

pub mod canon;
pub mod config;
pub mod coverage;
pub mod dedupe;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod model;
pub mod parser;
pub mod score;
pub mod snapshot;

pub use config::PipelineConfig;
pub use coverage::analyze;
pub use engine::reconcile;
pub use error::ReconError;
pub use model::{CanonicalDb, CoverageReport, EngineVariant, MergeReport};
