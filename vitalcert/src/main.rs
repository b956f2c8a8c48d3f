//! Synthetic clinical vitals release certification tool.
//!
//! This binary reads real and synthetic dataset documents, runs the
//! quality and privacy engines and writes JSON reports.
//!
//! # Security Guarantees
//! - Reports contain aggregates only
//! - Reports are checked for subject identifier leakage before writing
//! - Logs never contain record values or subject identifiers

use clap::Parser;
use tracing::error;
use vitalcert::{Cli, execute};
use vitalcert_core::{init_logging_with_format, initialize_dataset_validator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging_with_format(cli.global.verbose, cli.global.quiet, cli.global.log_format.into())?;

    // Initialize JSON Schema validator
    initialize_dataset_validator()?;

    match execute(&cli).await {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{:#}", e);
            Err(e)
        }
    }
}
