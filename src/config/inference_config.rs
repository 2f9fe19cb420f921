//! Inference server configuration parsing from environment variables.

use super::parse_usize;
use crate::domain::ml::feature_registry::INFERENCE_WINDOW;
use anyhow::{Result, bail};
use std::env;
use std::path::PathBuf;

/// Inference environment configuration
#[derive(Debug, Clone)]
pub struct InferenceEnvConfig {
    pub model_path: PathBuf,
    pub scalers_path: PathBuf,
    /// Candles per request
    pub window: usize,
}

impl Default for InferenceEnvConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("best_model.onnx"),
            scalers_path: PathBuf::from("scalers.json"),
            window: INFERENCE_WINDOW,
        }
    }
}

impl InferenceEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let window = parse_usize("INFERENCE_WINDOW", defaults.window)?;
        if window == 0 {
            bail!("INFERENCE_WINDOW must be positive");
        }

        Ok(Self {
            model_path: env::var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            scalers_path: env::var("SCALERS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.scalers_path),
            window,
        })
    }
}
