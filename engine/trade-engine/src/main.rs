//! # Trade Evaluation CLI
//!
//! Evaluates one trade from a JSON file and prints the result as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use trade_engine::{LeagueConfig, TradeEvaluationInput, TradeEvaluator};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Evaluate a proposed trade between two teams
#[derive(Parser)]
#[command(name = "trade-eval")]
#[command(about = "Trade valuation and positional grading for league trades")]
struct Cli {
    /// JSON file with `request`, `team_roster` and `partner_roster`
    #[arg(short, long, required_unless_present = "print_config")]
    input: Option<PathBuf>,

    /// League rules file (TOML or JSON); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,

    /// Print the effective league rules and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries only JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = LeagueConfig::load(cli.config.as_deref()).context("Failed to load league configuration")?;
    info!("Loaded league rules {}", config.version);

    if cli.print_config {
        println!("{}", to_json(&config, cli.pretty)?);
        return Ok(());
    }

    let Some(path) = cli.input else {
        anyhow::bail!("--input is required");
    };
    let raw = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let input: TradeEvaluationInput =
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse trade input {}", path.display()))?;

    let evaluator = TradeEvaluator::new(config)?;
    match evaluator.evaluate_input(&input) {
        Ok(evaluation) => {
            println!("{}", to_json(&evaluation, cli.pretty)?);
            Ok(())
        }
        Err(e) => {
            error!("Trade evaluation failed: {}", e);
            Err(e.into())
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}
