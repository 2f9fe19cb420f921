//! snipeml inference server
//!
//! Reads one JSON request per line on stdin and writes one JSON prediction per
//! line on stdout. Logs go to stderr so stdout carries only protocol lines.
//!
//! # Usage
//! ```sh
//! MODEL_PATH=best_model.onnx SCALERS_PATH=scalers.json cargo run --release < requests.jsonl
//! ```
//!
//! # Environment Variables
//! - `MODEL_PATH` - ONNX model file (default: best_model.onnx)
//! - `SCALERS_PATH` - Scaler document (default: scalers.json)
//! - `INFERENCE_WINDOW` - Candles per request (default: 100)

use anyhow::{Context, Result};
use clap::Parser;
use snipeml::application::ml::inference_service::InferenceService;
use snipeml::config::Config;
use snipeml::infrastructure::OnnxPredictor;
use snipeml::infrastructure::persistence::ScalerStore;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the ONNX model (overrides MODEL_PATH)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Path to the scaler document (overrides SCALERS_PATH)
    #[arg(long)]
    scalers: Option<PathBuf>,

    /// Candles per request (overrides INFERENCE_WINDOW)
    #[arg(long)]
    window: Option<usize>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_target(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stderr_layer)
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?.inference;
    if let Some(model) = args.model {
        config.model_path = model;
    }
    if let Some(scalers) = args.scalers {
        config.scalers_path = scalers;
    }
    if let Some(window) = args.window {
        config.window = window;
    }

    info!("snipeml inference server {} starting...", env!("CARGO_PKG_VERSION"));

    let scalers = ScalerStore::new(&config.scalers_path).load()?;
    let predictor = OnnxPredictor::load(&config.model_path)
        .with_context(|| format!("Failed to load model {:?}", config.model_path))?;

    let service = InferenceService::new(Arc::new(predictor), scalers, config.window);
    info!("Inference server ready (window: {})", config.window);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let stats = service
        .run(stdin.lock(), stdout.lock())
        .context("Inference loop I/O failure")?;

    info!(
        "Shutting down: {} requests, {} failed",
        stats.processed, stats.failed
    );
    Ok(())
}
