use super::context_scorer::{ContextScorer, ContextScoringConfig};
use crate::domain::market::{Candle, TokenContext};
use crate::domain::ml::patterns::PatternFeatures;

/// Rule constants for pin bar and engulfing detection.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternThresholds {
    /// Dominant wick must exceed body times this multiplier
    pub min_wick_to_body: f64,
    /// Body must exceed the previous body times this ratio
    pub engulfing_body_ratio: f64,
    /// Body-to-range floor for an engulfing candle
    pub engulfing_min_body_to_range: f64,
    /// Cap applied to the wick rejection ratio
    pub max_wick_rejection: f64,
    /// Pin bar confidence = min(base + wick% * weight, cap) / 100
    pub pin_confidence_base: f64,
    pub pin_confidence_cap: f64,
    pub pin_wick_weight: f64,
    pub engulfing_confidence: f64,
}

impl Default for PatternThresholds {
    fn default() -> Self {
        Self {
            min_wick_to_body: 2.0,
            engulfing_body_ratio: 0.6,
            engulfing_min_body_to_range: 0.6,
            max_wick_rejection: 10.0,
            pin_confidence_base: 60.0,
            pin_confidence_cap: 80.0,
            pin_wick_weight: 0.3,
            engulfing_confidence: 0.65,
        }
    }
}

/// Detects pin bars and engulfing candles on the last two candles of a
/// window and attaches the context score of the whole window.
#[derive(Debug, Clone, Default)]
pub struct CandlePatternDetector {
    thresholds: PatternThresholds,
    context_scorer: ContextScorer,
}

impl CandlePatternDetector {
    pub fn new(thresholds: PatternThresholds, context: ContextScoringConfig) -> Self {
        Self {
            thresholds,
            context_scorer: ContextScorer::new(context),
        }
    }

    pub fn thresholds(&self) -> &PatternThresholds {
        &self.thresholds
    }

    pub fn context_scorer(&self) -> &ContextScorer {
        &self.context_scorer
    }

    pub fn detect(&self, candles: &[Candle], context: &TokenContext) -> PatternFeatures {
        let [.., prev, last] = candles else {
            return PatternFeatures::default();
        };
        let t = &self.thresholds;

        let body = last.body();
        let upper_wick = last.upper_wick();
        let lower_wick = last.lower_wick();
        let total_range = last.range();

        let body_to_range_ratio = if total_range > 0.0 {
            (body / total_range).max(0.0).min(1.0)
        } else {
            0.0
        };
        let wick_rejection_ratio = if body > 0.0 {
            (upper_wick.max(lower_wick) / body)
                .max(0.0)
                .min(t.max_wick_rejection)
        } else {
            0.0
        };

        let mut features = PatternFeatures {
            wick_rejection_ratio,
            body_to_range_ratio,
            ..Default::default()
        };
        let mut confidence: f64 = 0.0;

        if lower_wick > body * t.min_wick_to_body && last.is_bullish() {
            features.has_bullish_pin = true;
            confidence = confidence.max(self.pin_confidence(lower_wick, total_range));
        }

        if upper_wick > body * t.min_wick_to_body && last.is_bearish() {
            features.has_bearish_pin = true;
            confidence = confidence.max(self.pin_confidence(upper_wick, total_range));
        }

        let engulfs_previous = body > prev.body() * t.engulfing_body_ratio;
        let strong_body = body_to_range_ratio > t.engulfing_min_body_to_range;

        if last.is_bullish() && engulfs_previous && strong_body {
            features.has_bullish_engulfing = true;
            confidence = confidence.max(t.engulfing_confidence);
        }

        if last.is_bearish() && engulfs_previous && strong_body {
            features.has_bearish_engulfing = true;
            confidence = confidence.max(t.engulfing_confidence);
        }

        features.pattern_confidence = confidence;
        features.context_score = self.context_scorer.score(candles, context);
        features
    }

    fn pin_confidence(&self, wick: f64, total_range: f64) -> f64 {
        let t = &self.thresholds;
        if total_range > 0.0 {
            let wick_pct = wick / total_range * 100.0;
            (t.pin_confidence_base + wick_pct * t.pin_wick_weight).min(t.pin_confidence_cap) / 100.0
        } else {
            t.pin_confidence_base / 100.0
        }
    }
}
