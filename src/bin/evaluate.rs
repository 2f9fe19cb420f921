use anyhow::{Context, Result};
use clap::Parser;
use snipeml::application::ml::evaluation;
use snipeml::infrastructure::OnnxPredictor;
use snipeml::infrastructure::persistence::processed_writer::read_split;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::prelude::*;

/// Score a processed split with an ONNX model and print classification and
/// regression metrics.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Processed split written by `preprocess`
    #[arg(long, default_value = "processed/test.csv")]
    split: PathBuf,

    /// ONNX model file
    #[arg(long, default_value = "best_model.onnx")]
    model: PathBuf,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();

    println!("Loading test data from {:?}", args.split);
    let split = read_split(&args.split, "test")?;
    println!("Loaded {} rows", split.len());

    let predictor = OnnxPredictor::load(&args.model)
        .with_context(|| format!("Failed to load model {:?}", args.model))?;

    let report = evaluation::evaluate(&predictor, &split).context("Evaluation failed")?;
    println!("\nTest Results:");
    println!("{}", report);
    Ok(())
}
