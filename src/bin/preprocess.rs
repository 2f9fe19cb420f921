use anyhow::{Context, Result};
use clap::Parser;
use snipeml::application::ml::dataset_split::DatasetSplitter;
use snipeml::application::ml::feature_assembler::FeatureAssembler;
use snipeml::application::ml::preprocessor::Preprocessor;
use snipeml::infrastructure::persistence::{DatasetStore, ProcessedSplitWriter, ScalerStore};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::prelude::*;

/// Split a dataset, fit scalers on the training split and write model-ready CSVs.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input dataset JSON
    #[arg(long, default_value = "trainingData_with_patterns.json")]
    input: PathBuf,

    /// Where the scaler document is written
    #[arg(long, default_value = "scalers.json")]
    scalers: PathBuf,

    /// Directory for train.csv, val.csv and test.csv
    #[arg(long, default_value = "processed")]
    output_dir: PathBuf,

    /// Training share of each label class
    #[arg(long, default_value_t = 0.7)]
    train_fraction: f64,

    /// Split seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();
    if !(0.0..=1.0).contains(&args.train_fraction) {
        anyhow::bail!("--train-fraction must be within [0, 1]");
    }

    println!("Loading data from {:?}", args.input);
    let document = DatasetStore::load(&args.input)?;

    let preprocessor = Preprocessor::new(
        FeatureAssembler::new(),
        DatasetSplitter::new(args.train_fraction, args.seed),
    );
    let output = preprocessor
        .run(&document.examples)
        .context("Preprocessing failed")?;

    println!("Data shapes:");
    println!(
        "  Candles: ({}, {}, 5)",
        document.examples.len(),
        output.window
    );
    println!("  Combined: ({}, 18)", document.examples.len());
    if output.pattern_fallbacks > 0 {
        println!(
            "  {} examples had no pattern features (zero vector used)",
            output.pattern_fallbacks
        );
    }

    let total = document.examples.len().max(1) as f64;
    println!("Split complete:");
    for split in output.splits() {
        println!(
            "  {:<5} {} examples ({:.1}%), profitable {}/{}",
            split.name,
            split.len(),
            split.len() as f64 / total * 100.0,
            split.profitable_count(),
            split.len()
        );
    }

    ScalerStore::new(&args.scalers).save(&output.scalers)?;
    let writer = ProcessedSplitWriter::new(&args.output_dir);
    for split in output.splits() {
        writer.write(split, output.window)?;
    }

    println!("Preprocessing complete");
    Ok(())
}
