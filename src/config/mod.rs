//! Configuration module for snipeml.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: feature extraction and inference serving.

mod feature_config;
mod inference_config;

pub use feature_config::FeatureEnvConfig;
pub use inference_config::InferenceEnvConfig;

use anyhow::{Context, Result};
use std::env;

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub features: FeatureEnvConfig,
    pub inference: InferenceEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            features: FeatureEnvConfig::from_env()?,
            inference: InferenceEnvConfig::from_env()?,
        })
    }
}

pub(crate) fn parse_usize(key: &str, default: usize) -> Result<usize> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<usize>()
        .context(format!("Failed to parse {}", key))
}

pub(crate) fn parse_f64(key: &str, default: f64) -> Result<f64> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<f64>()
        .context(format!("Failed to parse {}", key))
}
