//! Feature extraction configuration parsing from environment variables.
//!
//! This module handles the candlestick rule constants and context scoring tiers.

use super::{parse_f64, parse_usize};
use crate::application::ml::context_scorer::ContextScoringConfig;
use crate::application::ml::pattern_detector::{CandlePatternDetector, PatternThresholds};
use anyhow::{Result, bail};

/// Feature environment configuration
#[derive(Debug, Clone, Default)]
pub struct FeatureEnvConfig {
    pub thresholds: PatternThresholds,
    pub context: ContextScoringConfig,
}

impl FeatureEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = PatternThresholds::default();
        let thresholds = PatternThresholds {
            min_wick_to_body: parse_f64("PATTERN_MIN_WICK_TO_BODY", defaults.min_wick_to_body)?,
            engulfing_body_ratio: parse_f64(
                "PATTERN_ENGULFING_BODY_RATIO",
                defaults.engulfing_body_ratio,
            )?,
            engulfing_min_body_to_range: parse_f64(
                "PATTERN_ENGULFING_MIN_BODY_TO_RANGE",
                defaults.engulfing_min_body_to_range,
            )?,
            max_wick_rejection: parse_f64(
                "PATTERN_MAX_WICK_REJECTION",
                defaults.max_wick_rejection,
            )?,
            ..defaults
        };

        let defaults = ContextScoringConfig::default();
        let context = ContextScoringConfig {
            lookback: parse_usize("CONTEXT_LOOKBACK", defaults.lookback)?,
            high_liquidity: parse_f64("CONTEXT_HIGH_LIQUIDITY", defaults.high_liquidity)?,
            mid_liquidity: parse_f64("CONTEXT_MID_LIQUIDITY", defaults.mid_liquidity)?,
            ..defaults
        };

        for (key, value) in [
            ("PATTERN_MIN_WICK_TO_BODY", thresholds.min_wick_to_body),
            ("PATTERN_ENGULFING_BODY_RATIO", thresholds.engulfing_body_ratio),
            (
                "PATTERN_ENGULFING_MIN_BODY_TO_RANGE",
                thresholds.engulfing_min_body_to_range,
            ),
            ("PATTERN_MAX_WICK_REJECTION", thresholds.max_wick_rejection),
            ("CONTEXT_HIGH_LIQUIDITY", context.high_liquidity),
            ("CONTEXT_MID_LIQUIDITY", context.mid_liquidity),
        ] {
            if !value.is_finite() {
                bail!("{} must be a finite number, got {}", key, value);
            }
        }

        if context.lookback == 0 {
            bail!("CONTEXT_LOOKBACK must be positive");
        }
        if context.mid_liquidity > context.high_liquidity {
            bail!(
                "CONTEXT_MID_LIQUIDITY ({}) must not exceed CONTEXT_HIGH_LIQUIDITY ({})",
                context.mid_liquidity,
                context.high_liquidity
            );
        }
        if thresholds.max_wick_rejection <= 0.0 {
            bail!(
                "PATTERN_MAX_WICK_REJECTION must be positive, got {}",
                thresholds.max_wick_rejection
            );
        }

        Ok(Self {
            thresholds,
            context,
        })
    }

    pub fn detector(&self) -> CandlePatternDetector {
        CandlePatternDetector::new(self.thresholds.clone(), self.context.clone())
    }
}
