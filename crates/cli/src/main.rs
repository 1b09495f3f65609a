// motordex CLI - headless engine-catalog reconciliation

mod exit_codes;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use motordex_recon::ingest::{load_csv_rows, IncomingRows};
use motordex_recon::model::MergeReport;
use motordex_recon::{analyze, reconcile, CanonicalDb, PipelineConfig};

use exit_codes::{
    EXIT_INVALID_CONFIG, EXIT_PARSE, EXIT_RUNTIME, EXIT_SUCCESS, EXIT_UNRESOLVED, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "motordex")]
#[command(about = "Vehicle-engine catalog reconciliation pipeline")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile incoming rows against a canonical snapshot
    #[command(after_help = "\
Examples:
  motordex reconcile --canonical db.json --rows scraped.json
  motordex reconcile --canonical db.json --rows scraped.csv --config pipeline.toml
  motordex reconcile --canonical db.json --rows scraped.json --output db-next.json --report report.json
  motordex reconcile --canonical db.json --rows scraped.json --json")]
    Reconcile {
        /// Canonical snapshot JSON file
        #[arg(long)]
        canonical: PathBuf,

        /// Incoming rows (.json flat or grouped, or .csv)
        #[arg(long)]
        rows: PathBuf,

        /// Pipeline TOML config (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the merged snapshot to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write the merge report JSON to file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Print the merge report JSON to stdout instead of a human summary
        #[arg(long)]
        json: bool,
    },

    /// Audit a canonical snapshot for coverage gaps and duplicates
    #[command(after_help = "\
Examples:
  motordex coverage --canonical db.json
  motordex coverage --canonical db.json --json
  motordex coverage --canonical db.json --output coverage.json")]
    Coverage {
        /// Canonical snapshot JSON file
        #[arg(long)]
        canonical: PathBuf,

        /// Write the coverage report JSON to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the coverage report JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Validate a pipeline config without running
    #[command(after_help = "\
Examples:
  motordex validate pipeline.toml")]
    Validate {
        /// Path to the pipeline TOML config file
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Reconcile {
            canonical,
            rows,
            config,
            output,
            report,
            json,
        } => cmd_reconcile(canonical, rows, config, output, report, json),
        Commands::Coverage {
            canonical,
            output,
            json,
        } => cmd_coverage(canonical, output, json),
        Commands::Validate { config } => cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError {
            code,
            message,
            hint,
        }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    fn new(code: u8, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            hint: None,
        }
    }

    fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// reconcile
// ============================================================================

/// Run provenance attached at this layer only, so engine output stays
/// byte-identical across runs.
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct RunMeta {
    pipeline_name: String,
    engine_version: String,
    run_at: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ReconcileOutput {
    meta: RunMeta,
    #[serde(flatten)]
    report: MergeReport,
}

fn load_config(path: Option<PathBuf>) -> Result<PipelineConfig, CliError> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let config_str = std::fs::read_to_string(&path).map_err(|e| {
        CliError::new(EXIT_USAGE, format!("cannot read {}: {e}", path.display()))
    })?;
    PipelineConfig::from_toml(&config_str)
        .map_err(|e| CliError::new(EXIT_INVALID_CONFIG, e.to_string()))
}

fn load_snapshot(path: &PathBuf) -> Result<CanonicalDb, CliError> {
    let data = std::fs::read_to_string(path).map_err(|e| {
        CliError::new(EXIT_USAGE, format!("cannot read {}: {e}", path.display()))
    })?;
    CanonicalDb::from_json(&data).map_err(|e| CliError::new(EXIT_PARSE, e.to_string()))
}

fn cmd_reconcile(
    canonical_path: PathBuf,
    rows_path: PathBuf,
    config_path: Option<PathBuf>,
    output_file: Option<PathBuf>,
    report_file: Option<PathBuf>,
    json_output: bool,
) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let db = load_snapshot(&canonical_path)?;

    let rows_data = std::fs::read_to_string(&rows_path).map_err(|e| {
        CliError::new(
            EXIT_USAGE,
            format!("cannot read {}: {e}", rows_path.display()),
        )
    })?;

    // Format by extension: .csv is the flat export contract, everything
    // else is parsed as one of the two JSON shapes.
    let is_csv = rows_path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    let normalized = if is_csv {
        let flat =
            load_csv_rows(&rows_data).map_err(|e| CliError::new(EXIT_PARSE, e.to_string()))?;
        IncomingRows::Flat(flat).normalize()
    } else {
        IncomingRows::from_json(&rows_data)
            .map_err(|e| {
                CliError::new(EXIT_PARSE, e.to_string())
                    .with_hint("rows must be a flat record list or a manufacturer/model map")
            })?
            .normalize()
    };

    let (merged, mut merge_report) = reconcile(&db, &normalized.variants, &config);
    merge_report.malformed_rows = normalized.malformed;

    let output = ReconcileOutput {
        meta: RunMeta {
            pipeline_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        report: merge_report,
    };

    let report_json = serde_json::to_string_pretty(&output)
        .map_err(|e| CliError::new(EXIT_RUNTIME, format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        let snapshot_json = merged
            .to_json()
            .map_err(|e| CliError::new(EXIT_RUNTIME, e.to_string()))?;
        std::fs::write(path, snapshot_json)
            .map_err(|e| CliError::new(EXIT_RUNTIME, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(ref path) = report_file {
        std::fs::write(path, &report_json)
            .map_err(|e| CliError::new(EXIT_RUNTIME, format!("cannot write report: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{report_json}");
    }

    // Human summary to stderr
    let r = &output.report;
    eprintln!(
        "reconcile '{}': {} makes, {} models — {} matched, {} added, {} unmatched, {} malformed",
        config.name,
        r.makes_processed,
        r.models_processed,
        r.engines_matched,
        r.engines_added,
        r.unmatched.len(),
        r.malformed_rows,
    );

    if !r.unmatched.is_empty() || r.malformed_rows > 0 {
        return Err(CliError::new(
            EXIT_UNRESOLVED,
            "unreconciled rows present",
        ));
    }
    Ok(())
}

// ============================================================================
// coverage
// ============================================================================

fn cmd_coverage(
    canonical_path: PathBuf,
    output_file: Option<PathBuf>,
    json_output: bool,
) -> Result<(), CliError> {
    let db = load_snapshot(&canonical_path)?;
    let report = analyze(&db);

    let json_str = serde_json::to_string_pretty(&report)
        .map_err(|e| CliError::new(EXIT_RUNTIME, format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::new(EXIT_RUNTIME, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    eprintln!(
        "coverage: {} makes — {} empty pools, {} missing year mappings, {} dup-label buckets, {} dup-key buckets, {} overlapping spans",
        report.makes,
        report.missing_manufacturer_pools.len(),
        report.missing_model_year_mappings.len(),
        report.duplicate_entries_by_bucket.len(),
        report.duplicate_keys_by_bucket.len(),
        report.overlapping_buckets.len(),
    );

    Ok(())
}

// ============================================================================
// validate
// ============================================================================

fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config_str = std::fs::read_to_string(&config_path).map_err(|e| {
        CliError::new(
            EXIT_USAGE,
            format!("cannot read {}: {e}", config_path.display()),
        )
    })?;

    let config = PipelineConfig::from_toml(&config_str)
        .map_err(|e| CliError::new(EXIT_INVALID_CONFIG, e.to_string()))?;

    eprintln!(
        "valid: pipeline '{}', threshold {}, capacity tolerance {}/{} L",
        config.name,
        config.match_threshold,
        config.tolerance.capacity_tight_liters,
        config.tolerance.capacity_loose_liters,
    );
    Ok(())
}
