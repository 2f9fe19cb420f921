use crate::domain::ml::feature_registry::PATTERN_WIDTH;
use serde::{Deserialize, Serialize};

/// Candlestick pattern signals derived from the tail of a candle window.
///
/// Always recomputable from candles and context; a persisted copy is a cache,
/// never the source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PatternFeatures {
    #[serde(alias = "hasBullishPin")]
    pub has_bullish_pin: bool,
    #[serde(alias = "hasBearishPin")]
    pub has_bearish_pin: bool,
    #[serde(alias = "hasBullishEngulfing")]
    pub has_bullish_engulfing: bool,
    #[serde(alias = "hasBearishEngulfing")]
    pub has_bearish_engulfing: bool,
    /// Dominant wick over body, in [0, 10]
    #[serde(alias = "wickRejectionRatio")]
    pub wick_rejection_ratio: f64,
    /// Body over full range, in [0, 1]
    #[serde(alias = "bodyToRangeRatio")]
    pub body_to_range_ratio: f64,
    /// Strongest matched rule, in [0, 1]
    #[serde(alias = "patternConfidence")]
    pub pattern_confidence: f64,
    /// Market context score, in [0, 1]
    #[serde(alias = "contextScore")]
    pub context_score: f64,
}

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

impl PatternFeatures {
    /// Flattens into registry order, booleans as 1.0 / 0.0.
    pub fn to_vector(&self) -> [f64; PATTERN_WIDTH] {
        [
            flag(self.has_bullish_pin),
            flag(self.has_bearish_pin),
            flag(self.has_bullish_engulfing),
            flag(self.has_bearish_engulfing),
            self.wick_rejection_ratio,
            self.body_to_range_ratio,
            self.pattern_confidence,
            self.context_score,
        ]
    }

    pub fn has_any_pattern(&self) -> bool {
        self.has_bullish_pin
            || self.has_bearish_pin
            || self.has_bullish_engulfing
            || self.has_bearish_engulfing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_all_zero() {
        let patterns = PatternFeatures::default();
        assert_eq!(patterns.to_vector(), [0.0; PATTERN_WIDTH]);
        assert!(!patterns.has_any_pattern());
    }

    #[test]
    fn test_vector_order() {
        let patterns = PatternFeatures {
            has_bullish_pin: true,
            has_bearish_pin: false,
            has_bullish_engulfing: true,
            has_bearish_engulfing: false,
            wick_rejection_ratio: 3.5,
            body_to_range_ratio: 0.7,
            pattern_confidence: 0.75,
            context_score: 0.6,
        };
        assert_eq!(
            patterns.to_vector(),
            [1.0, 0.0, 1.0, 0.0, 3.5, 0.7, 0.75, 0.6]
        );
    }

    #[test]
    fn test_deserialize_snake_and_camel() {
        let snake = r#"{"has_bullish_pin":true,"has_bearish_pin":false,"has_bullish_engulfing":false,
            "has_bearish_engulfing":false,"wick_rejection_ratio":2.0,"body_to_range_ratio":0.2,
            "pattern_confidence":0.7,"context_score":0.1}"#;
        let camel = r#"{"hasBullishPin":true,"hasBearishPin":false,"hasBullishEngulfing":false,
            "hasBearishEngulfing":false,"wickRejectionRatio":2.0,"bodyToRangeRatio":0.2,
            "patternConfidence":0.7,"contextScore":0.1}"#;

        let a: PatternFeatures = serde_json::from_str(snake).unwrap();
        let b: PatternFeatures = serde_json::from_str(camel).unwrap();
        assert_eq!(a, b);
        assert!(a.has_bullish_pin);
    }
}
