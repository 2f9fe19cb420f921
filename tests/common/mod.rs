#![allow(dead_code)]

use snipeml::domain::market::{Candle, IndicatorSet, TokenContext};
use snipeml::domain::ml::dataset::{Labels, TrainingExample};
use snipeml::domain::ml::patterns::PatternFeatures;

/// Deterministic candle window with a gentle uptrend and varying wicks.
pub fn candle_window(seed: usize, len: usize) -> Vec<Candle> {
    (0..len)
        .map(|t| {
            let base = 1.0 + seed as f64 * 0.05 + t as f64 * 0.002;
            let wobble = ((t + seed) % 7) as f64 * 0.001;
            let open = base + wobble;
            let close = base + 0.003 - wobble * 0.5;
            let high = open.max(close) + 0.002 + (t % 3) as f64 * 0.001;
            let low = open.min(close) - 0.001 - (t % 5) as f64 * 0.0005;
            Candle::new(open, high, low, close, 1_000.0 + (seed * 37 + t * 11) as f64)
        })
        .collect()
}

pub fn context(seed: usize) -> TokenContext {
    TokenContext {
        liquidity: 20_000.0 + seed as f64 * 1_500.0,
        market_cap: 150_000.0 + seed as f64 * 9_000.0,
        holders: 120.0 + seed as f64 * 4.0,
        age_hours: 2.0 + (seed % 24) as f64,
        volume_24h: 40_000.0 + (seed % 9) as f64 * 2_500.0,
    }
}

pub fn indicators(seed: usize) -> IndicatorSet {
    IndicatorSet {
        rsi: 30.0 + (seed % 40) as f64,
        macd: (seed as f64 - 20.0) * 0.0004,
        ema_fast: 1.0 + seed as f64 * 0.01,
        ema_slow: 0.98 + seed as f64 * 0.01,
        bbands_width: 0.02 + (seed % 5) as f64 * 0.01,
    }
}

pub fn patterns(seed: usize) -> PatternFeatures {
    PatternFeatures {
        has_bullish_pin: seed % 4 == 0,
        has_bearish_pin: false,
        has_bullish_engulfing: seed % 5 == 0,
        has_bearish_engulfing: false,
        wick_rejection_ratio: (seed % 10) as f64 * 0.4,
        body_to_range_ratio: 0.3 + (seed % 3) as f64 * 0.1,
        pattern_confidence: if seed % 4 == 0 { 0.75 } else { 0.0 },
        context_score: 0.5 + (seed % 2) as f64 * 0.2,
    }
}

pub fn example(seed: usize, window: usize, with_patterns: bool) -> TrainingExample {
    TrainingExample {
        candles: candle_window(seed, window)
            .into_iter()
            .map(Into::into)
            .collect(),
        context: Some(context(seed).into()),
        indicators: Some(indicators(seed).into()),
        patterns: with_patterns.then(|| patterns(seed)),
        labels: Some(Labels {
            profitable: seed % 3 == 0,
            max_profit: seed as f64 * 0.25 - 1.0,
            rug_risk: seed % 7 == 0,
        }),
        ..Default::default()
    }
}

pub fn dataset(n: usize, window: usize) -> Vec<TrainingExample> {
    (0..n).map(|i| example(i, window, true)).collect()
}
