/// Per-timestep candle fields, in matrix column order.
pub const CANDLE_FIELDS: &[&str] = &["open", "high", "low", "close", "volume"];

/// Ordered context feature names.
pub const CONTEXT_FEATURES: &[&str] = &[
    "liquidity",
    "market_cap",
    "holders",
    "age_hours",
    "volume_24h",
];

/// Ordered indicator feature names.
pub const INDICATOR_FEATURES: &[&str] =
    &["rsi", "macd", "ema_fast", "ema_slow", "bbands_width"];

/// Ordered pattern feature names.
pub const PATTERN_FEATURES: &[&str] = &[
    "has_bullish_pin",
    "has_bearish_pin",
    "has_bullish_engulfing",
    "has_bearish_engulfing",
    "wick_rejection_ratio",
    "body_to_range_ratio",
    "pattern_confidence",
    "context_score",
];

pub const CANDLE_WIDTH: usize = 5;
pub const CONTEXT_WIDTH: usize = 5;
pub const INDICATOR_WIDTH: usize = 5;
pub const PATTERN_WIDTH: usize = 8;

/// context(5) ++ indicators(5) ++ patterns(8).
/// This order MUST match the order the model was trained with.
/// Any change here is a breaking change for trained models.
pub const COMBINED_WIDTH: usize = CONTEXT_WIDTH + INDICATOR_WIDTH + PATTERN_WIDTH;

/// Window length the serving model was trained on.
pub const INFERENCE_WINDOW: usize = 100;

/// Names of the combined vector columns, in order.
pub fn combined_feature_names() -> Vec<&'static str> {
    CONTEXT_FEATURES
        .iter()
        .chain(INDICATOR_FEATURES.iter())
        .chain(PATTERN_FEATURES.iter())
        .copied()
        .collect()
}

/// Concatenates the three feature groups in registry order.
pub fn combine(
    context: &[f64; CONTEXT_WIDTH],
    indicators: &[f64; INDICATOR_WIDTH],
    patterns: &[f64; PATTERN_WIDTH],
) -> [f64; COMBINED_WIDTH] {
    let mut combined = [0.0; COMBINED_WIDTH];
    combined[..CONTEXT_WIDTH].copy_from_slice(context);
    combined[CONTEXT_WIDTH..CONTEXT_WIDTH + INDICATOR_WIDTH].copy_from_slice(indicators);
    combined[CONTEXT_WIDTH + INDICATOR_WIDTH..].copy_from_slice(patterns);
    combined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_widths_match_names() {
        assert_eq!(CANDLE_FIELDS.len(), CANDLE_WIDTH);
        assert_eq!(CONTEXT_FEATURES.len(), CONTEXT_WIDTH);
        assert_eq!(INDICATOR_FEATURES.len(), INDICATOR_WIDTH);
        assert_eq!(PATTERN_FEATURES.len(), PATTERN_WIDTH);
        assert_eq!(combined_feature_names().len(), COMBINED_WIDTH);
        assert_eq!(COMBINED_WIDTH, 18);
    }

    #[test]
    fn test_combined_order() {
        let combined = combine(
            &[1.0, 2.0, 3.0, 4.0, 5.0],
            &[6.0, 7.0, 8.0, 9.0, 10.0],
            &[11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 18.0],
        );
        for (i, v) in combined.iter().enumerate() {
            assert_eq!(*v, (i + 1) as f64);
        }

        let names = combined_feature_names();
        // Liquidity is index 0
        assert_eq!(names[0], "liquidity");
        // RSI opens the indicator block
        assert_eq!(names[5], "rsi");
        // Context score is last
        assert_eq!(names[17], "context_score");
    }
}
