use anyhow::{Context, Result};
use clap::Parser;
use snipeml::application::ml::pattern_enrichment::PatternEnricher;
use snipeml::config::Config;
use snipeml::infrastructure::persistence::DatasetStore;
use std::path::PathBuf;
use tracing::{Level, warn};
use tracing_subscriber::prelude::*;

/// Recompute candlestick pattern features for every example of a dataset.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input dataset JSON (wrapped document or bare example array)
    #[arg(long, default_value = "trainingData_checkpoint.json")]
    input: PathBuf,

    /// Output dataset JSON. Defaults to `<input>_with_patterns.json`
    #[arg(long)]
    output: Option<PathBuf>,

    /// Overwrite patterns that are already present without complaining
    #[arg(long)]
    force: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();
    let config = Config::from_env()?.features;
    let output = args
        .output
        .unwrap_or_else(|| DatasetStore::enriched_path(&args.input));

    println!("Loading training data from {:?}", args.input);
    let mut document = DatasetStore::load(&args.input)?;
    println!("Loaded {} examples", document.examples.len());

    let already = document
        .examples
        .iter()
        .filter(|e| e.patterns.is_some())
        .count();
    if already > 0 && !args.force {
        warn!(
            "{} examples already have pattern features, re-run with --force to recalculate",
            already
        );
        return Ok(());
    }

    println!("Calculating candlestick patterns...");
    let enricher = PatternEnricher::new(config.detector());
    let stats = enricher
        .enrich(&mut document.examples)
        .context("Pattern calculation failed")?;

    if let Some(sample) = document.examples.first().and_then(|e| e.patterns.as_ref()) {
        println!("\nSample pattern from first example:");
        println!("  Bullish pin: {}", sample.has_bullish_pin);
        println!("  Bearish pin: {}", sample.has_bearish_pin);
        println!("  Wick rejection ratio: {:.2}", sample.wick_rejection_ratio);
        println!("  Body to range: {:.2}", sample.body_to_range_ratio);
        println!("  Pattern confidence: {:.2}", sample.pattern_confidence);
        println!("  Context score: {:.2}", sample.context_score);
    }

    println!("\nPattern statistics:");
    for (label, count) in [
        ("Bullish pin bars", stats.bullish_pins),
        ("Bearish pin bars", stats.bearish_pins),
        ("Bullish engulfing", stats.bullish_engulfing),
        ("Bearish engulfing", stats.bearish_engulfing),
    ] {
        println!("  {}: {} ({:.1}%)", label, count, stats.percent(count));
    }

    DatasetStore::save(&output, &document)?;
    println!(
        "\nSaved {} examples with pattern features to {:?}",
        stats.total, output
    );
    Ok(())
}
