//! Library module for the vitalcert command line tool
//!
//! This module exposes the CLI definition and command execution for
//! testing purposes. The binary entry point is in main.rs.

pub mod output;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use vitalcert_core::{
    CertificationConfig, Certifier, DistributionComparator, LogFormat, PrivacyInputs,
    PrivacyRiskEngine, RecordSet, quality::DistanceMetric, validate_and_parse_dataset,
};

/// Exit code returned when a release fails certification
pub const EXIT_NOT_CERTIFIED: i32 = 2;

/// CLI argument structure
#[derive(Parser, Debug)]
#[command(name = "vitalcert")]
#[command(about = "Synthetic clinical vitals release certification")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "
VitalCert - Synthetic clinical vitals release certification

Compares a synthetic dataset against the real trial data it was generated
from and assesses the disclosure risk of releasing it:
- Per-column distribution distance, correlation preservation, utility
- k-anonymity, l-diversity, re-identification risk
- Differential privacy epsilon budget accounting

Reports contain aggregates only and are checked for subject identifier
leakage before they are written.

EXAMPLES:
  vitalcert quality --real real.json --synthetic synthetic.json
  vitalcert certify --real real.json --synthetic synthetic.json --inputs attacks.json -o report.json
  vitalcert schema
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments shared by every subcommand
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all output except errors")]
    pub quiet: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,

    /// Certification config file
    #[arg(long, global = true, value_name = "FILE", env = "VITALCERT_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Log format selectable on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => Self::Text,
            LogFormatArg::Json => Self::Json,
        }
    }
}

/// Distance metric selectable on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MetricArg {
    Ks,
    Wasserstein,
}

impl From<MetricArg> for DistanceMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Ks => Self::KolmogorovSmirnov,
            MetricArg::Wasserstein => Self::Wasserstein,
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare synthetic distributions against the real dataset
    Quality(QualityArgs),
    /// Assess disclosure risk of the synthetic dataset
    Privacy(PrivacyArgs),
    /// Run both assessments and decide whether the release is certified
    Certify(CertifyArgs),
    /// Print the dataset JSON Schema
    Schema,
}

/// Real and synthetic dataset locations
#[derive(Args, Debug)]
pub struct DatasetArgs {
    /// Real dataset document
    #[arg(long, value_name = "FILE")]
    pub real: PathBuf,

    /// Synthetic dataset document
    #[arg(long, value_name = "FILE")]
    pub synthetic: PathBuf,

    /// Output file path (stdout when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct QualityArgs {
    #[command(flatten)]
    pub datasets: DatasetArgs,

    /// Number of histogram bins
    #[arg(long, value_name = "N")]
    pub bins: Option<usize>,

    /// Distribution distance metric
    #[arg(long, value_enum)]
    pub metric: Option<MetricArg>,
}

#[derive(Args, Debug)]
pub struct PrivacyArgs {
    #[command(flatten)]
    pub datasets: DatasetArgs,

    /// Attack observations and differential privacy queries
    #[arg(long, value_name = "FILE")]
    pub inputs: PathBuf,
}

#[derive(Args, Debug)]
pub struct CertifyArgs {
    #[command(flatten)]
    pub datasets: DatasetArgs,

    /// Attack observations and differential privacy queries
    #[arg(long, value_name = "FILE")]
    pub inputs: PathBuf,

    /// Minimum aggregate quality score
    #[arg(long, value_name = "SCORE")]
    pub min_quality: Option<f64>,
}

/// Loads the certification config, falling back to defaults.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or is invalid.
pub fn load_config(path: Option<&Path>) -> Result<CertificationConfig> {
    match path {
        Some(path) => CertificationConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(CertificationConfig::default()),
    }
}

/// Reads and validates a dataset document.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails schema validation.
pub async fn load_dataset(path: &Path) -> Result<RecordSet> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read dataset {}", path.display()))?;
    let records = validate_and_parse_dataset(&contents)
        .with_context(|| format!("Invalid dataset document {}", path.display()))?;
    tracing::info!("Loaded dataset '{}' with {} records", records.name, records.len());
    Ok(records)
}

/// Reads privacy inputs (attack observations and queries).
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub async fn load_privacy_inputs(path: &Path) -> Result<PrivacyInputs> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read privacy inputs {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Invalid privacy inputs {}", path.display()))
}

/// Executes a parsed command line and returns the process exit code.
///
/// # Errors
///
/// Returns an error if loading inputs, running an engine or writing the
/// report fails. A budget exhaustion surfaces as an error.
pub async fn execute(cli: &Cli) -> Result<i32> {
    let config = load_config(cli.global.config.as_deref())?;

    match &cli.command {
        Commands::Quality(args) => run_quality(config, args).await,
        Commands::Privacy(args) => run_privacy(config, args).await,
        Commands::Certify(args) => run_certify(config, args).await,
        Commands::Schema => {
            let schema = vitalcert_core::validation::get_dataset_schema_definition()
                .context("Failed to load dataset schema")?;
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(0)
        }
    }
}

async fn run_quality(mut config: CertificationConfig, args: &QualityArgs) -> Result<i32> {
    if let Some(bins) = args.bins {
        config.quality = config.quality.with_bin_count(bins);
    }
    if let Some(metric) = args.metric {
        config.quality = config.quality.with_distance_metric(metric.into());
    }

    let real = load_dataset(&args.datasets.real).await?;
    let synthetic = load_dataset(&args.datasets.synthetic).await?;

    let comparator = DistributionComparator::new(config.quality)?;
    let report = comparator.compare_concurrent(&real, &synthetic).await?;

    output::write_report(&report, &real.subject_ids(), args.datasets.output.as_deref()).await?;
    Ok(0)
}

async fn run_privacy(config: CertificationConfig, args: &PrivacyArgs) -> Result<i32> {
    let real = load_dataset(&args.datasets.real).await?;
    let synthetic = load_dataset(&args.datasets.synthetic).await?;
    let inputs = load_privacy_inputs(&args.inputs).await?;

    let engine = PrivacyRiskEngine::with_in_memory_ledger(config.privacy)?;
    let report = engine.assess(&real, &synthetic, &inputs)?;

    output::write_report(&report, &real.subject_ids(), args.datasets.output.as_deref()).await?;
    Ok(0)
}

async fn run_certify(mut config: CertificationConfig, args: &CertifyArgs) -> Result<i32> {
    if let Some(score) = args.min_quality {
        config = config.with_min_quality_score(score);
    }

    let real = load_dataset(&args.datasets.real).await?;
    let synthetic = load_dataset(&args.datasets.synthetic).await?;
    let inputs = load_privacy_inputs(&args.inputs).await?;

    let certifier = Certifier::new(config)?;
    let report = certifier.certify(&real, &synthetic, &inputs).await?;

    output::write_report(&report, &real.subject_ids(), args.datasets.output.as_deref()).await?;

    if report.certified {
        tracing::info!("Release certified");
        Ok(0)
    } else {
        for check in &report.privacy.overall.failed_checks {
            tracing::warn!("Privacy check failed: {:?}", check);
        }
        if report.quality.quality_score < report.min_quality_score {
            tracing::warn!(
                "Quality score {:.3} below minimum {:.3}",
                report.quality.quality_score,
                report.min_quality_score
            );
        }
        Ok(EXIT_NOT_CERTIFIED)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_json(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_quality_command() {
        let cli = Cli::try_parse_from([
            "vitalcert",
            "-vv",
            "quality",
            "--real",
            "real.json",
            "--synthetic",
            "syn.json",
            "--bins",
            "30",
            "--metric",
            "wasserstein",
        ])
        .unwrap();

        assert_eq!(cli.global.verbose, 2);
        match cli.command {
            Commands::Quality(args) => {
                assert_eq!(args.bins, Some(30));
                assert_eq!(args.metric, Some(MetricArg::Wasserstein));
                assert!(args.datasets.output.is_none());
            }
            other => panic!("expected quality command, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_certify_requires_inputs() {
        let result = Cli::try_parse_from([
            "vitalcert",
            "certify",
            "--real",
            "real.json",
            "--synthetic",
            "syn.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_metric() {
        let result = Cli::try_parse_from([
            "vitalcert",
            "quality",
            "--real",
            "a.json",
            "--synthetic",
            "b.json",
            "--metric",
            "energy",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_defaults_without_path() {
        let config = load_config(None).unwrap();
        assert_eq!(config.quality.bin_count, 20);
    }

    #[test]
    fn test_load_config_from_file() {
        let file = temp_json(r#"{"min_quality_score": 0.6, "quality": {"bin_count": 12}}"#);
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.min_quality_score, 0.6);
        assert_eq!(config.quality.bin_count, 12);
    }

    #[tokio::test]
    async fn test_load_dataset_rejects_invalid_document() {
        let file = temp_json(r#"{"format_version": "9.9", "name": "x", "records": []}"#);
        assert!(load_dataset(file.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_load_privacy_inputs_without_queries() {
        let file = temp_json(
            r#"{"attacks": {
                "singling_out": {"attack_success_rate": 0.05, "baseline_success_rate": 0.02},
                "linkability": {"attack_success_rate": 0.03, "baseline_success_rate": 0.02},
                "attribute_inference": {"attack_success_rate": 0.10, "baseline_success_rate": 0.08}
            }}"#,
        );
        let inputs = load_privacy_inputs(file.path()).await.unwrap();
        assert!(inputs.queries.is_empty());
    }
}
