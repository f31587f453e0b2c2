//! PartPal Price Optimizer
//!
//! Loads a BOM, normalizes its columns, and optionally reprices every component
//! against the configured distributors.

use anyhow::{Context, Result};
use clap::Parser;
use partpal_utils::{
    init_logging, AppConfig, BomParser, BomValidator, ColumnMap, ValidationSeverity,
    DEFAULT_CONFIG_PATH,
};
use std::path::PathBuf;
use tracing::{info, warn};

mod distributors;
mod render;
mod service;

use distributors::build_distributors;
use service::{OptimizerSettings, PriceOptimizer};

#[derive(Debug, Parser)]
#[command(name = "partpal", version, about = "Find the cheapest distributor price for every BOM line")]
struct Args {
    /// BOM file (CSV with a header row)
    #[arg(short, long)]
    input: PathBuf,

    /// Configuration file with distributor credentials
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Query distributors and keep the cheapest offer per component
    #[arg(long)]
    optimize: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = AppConfig::load(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;
    init_logging(&config.logging)?;

    info!("Starting PartPal");

    let column_map = ColumnMap::new().with_extra_synonyms(&config.bom.extra_synonyms)?;
    let bom = BomParser::with_column_map(column_map).parse_path(&args.input)?;

    let validation = BomValidator::new().validate(&bom);
    for issue in &validation.issues {
        match issue.severity {
            ValidationSeverity::Warning => {
                warn!(row = issue.row, field = %issue.field, "{}", issue.message)
            }
            ValidationSeverity::Info => {
                info!(row = issue.row, field = %issue.field, "{}", issue.message)
            }
        }
    }

    if !args.optimize {
        render::print_bom(&bom);
        return Ok(());
    }

    if !config.has_distributors() {
        warn!("No distributors configured, prices will not change");
    }
    let distributors = build_distributors(&config)?;

    let starting_total = bom.total_cost();
    let optimizer = PriceOptimizer::new(OptimizerSettings::from(&config.optimizer));
    let report = optimizer.optimize(bom, &distributors).await?;
    info!(
        run_id = %report.run_id,
        repriced = report.improved(),
        total = report.total_cost(),
        "Optimization complete"
    );

    render::print_report(&report, starting_total);

    Ok(())
}
