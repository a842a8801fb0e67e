//! Wheel Scan CLI
//!
//! Command-line front end: screens a ticker universe for wheel trades and
//! prints the ranked candidates with a GO / NO-GO verdict.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wheel_screener::prelude::*;

/// Screen US equities for cash-secured puts and covered calls
#[derive(Parser, Debug)]
#[command(name = "wheel-scan", version, about)]
struct Args {
    /// Comma-separated tickers (default: built-in universe)
    #[arg(long)]
    tickers: Option<String>,

    /// TOML or JSON file overriding the default thresholds
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read market data from a JSON snapshot instead of Yahoo Finance
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Also screen covered calls
    #[arg(long)]
    calls: bool,

    /// Skip cash-secured puts
    #[arg(long)]
    no_puts: bool,

    /// Rows to print
    #[arg(long, default_value_t = 20)]
    top: usize,

    /// Tickers screened concurrently
    #[arg(long)]
    workers: Option<usize>,

    /// Write the ranked candidates as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Scan date (default: today)
    #[arg(long, value_name = "YYYY-MM-DD")]
    as_of: Option<NaiveDate>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &args.config {
        Some(path) => WheelConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => WheelConfig::default(),
    };
    if args.calls {
        config.scan.scan_calls = true;
    }
    if args.no_puts {
        config.scan.scan_puts = false;
    }
    if let Some(workers) = args.workers {
        config.scan.workers = workers;
    }

    let tickers = match &args.tickers {
        Some(list) => parse_tickers(list),
        None => default_universe(),
    };
    let as_of = args
        .as_of
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let provider: Arc<dyn MarketDataProvider> = match &args.snapshot {
        Some(path) => {
            info!("Using snapshot {}", path.display());
            Arc::new(
                SnapshotProvider::from_file(path)
                    .with_context(|| format!("loading snapshot {}", path.display()))?,
            )
        }
        None => Arc::new(YahooClient::new().context("building Yahoo Finance client")?),
    };

    println!("Wheel Strategy Screener");
    println!("=======================\n");
    println!("  Date: {}", as_of);
    println!("  Tickers: {}", tickers.len());
    println!(
        "  Legs: {}{}",
        if config.scan.scan_puts { "CSP " } else { "" },
        if config.scan.scan_calls { "CC" } else { "" }
    );
    println!();

    let scanner = Scanner::new(provider, config)?;
    let report = scanner.scan(&tickers, as_of)?;

    print_table(&report, args.top);

    println!("\nFilter statistics:");
    println!("{}", report.stats);

    if !report.skipped.is_empty() {
        println!("\nSkipped {} ticker(s):", report.skipped.len());
        for skip in &report.skipped {
            println!("  {}: {}", skip.ticker, skip.reason);
        }
    }

    println!("\n{}", report.verdict(scanner.config()));

    if let Some(path) = &args.json {
        let json = serde_json::to_string_pretty(&report.candidates)
            .context("serializing candidates")?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("\nWrote {} candidates to {}", report.candidates.len(), path.display());
    }

    Ok(())
}

fn print_table(report: &ScanReport, top: usize) {
    if report.candidates.is_empty() {
        println!("No candidates passed the filters.");
        return;
    }

    println!(
        "Top {} of {} candidates ({} stable):\n",
        top.min(report.candidates.len()),
        report.candidates.len(),
        report.stable_count()
    );
    println!(
        "{:<6} {:<4} {:<10} {:>8} {:>8} {:>7} {:>6} {:>6} {:>7} {:>7} {:>6}  {}",
        "Ticker",
        "Leg",
        "Expiry",
        "Strike",
        "Premium",
        "Delta",
        "PoP",
        "DTE",
        "Ann%",
        "Cush%",
        "Score",
        "Flags"
    );
    println!("{}", "-".repeat(100));

    for c in report.top(top) {
        let mut flags = c.flags_label();
        if c.opportunity.is_some() {
            if !flags.is_empty() {
                flags.push('|');
            }
            flags.push_str("OPPORTUNITY");
        }
        if !c.is_stable && flags.is_empty() {
            flags.push_str("UNSTABLE");
        }

        println!(
            "{:<6} {:<4} {:<10} {:>8.2} {:>8.2} {:>7.3} {:>5.0}% {:>6} {:>6.1}% {:>6.1}% {:>6.1}  {}",
            c.ticker,
            c.leg_type.short_label(),
            c.expiry,
            c.strike,
            c.premium,
            c.delta,
            c.pop * 100.0,
            c.days_to_expiry,
            c.annualized_yield * 100.0,
            c.cushion * 100.0,
            c.composite_score,
            flags
        );
    }
}
