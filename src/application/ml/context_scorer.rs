use crate::domain::market::{Candle, TokenContext};

/// Tier thresholds and weights for the market context score.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextScoringConfig {
    /// Candles considered for trend and range position
    pub lookback: usize,
    /// Percent change above which the trend is strongly bullish
    pub strong_trend_pct: f64,
    pub strong_trend_weight: f64,
    pub mild_trend_weight: f64,
    /// Percent change below which the trend is bearish
    pub bearish_trend_pct: f64,
    pub bearish_trend_weight: f64,
    /// Range position below which price sits near support
    pub support_position: f64,
    pub support_weight: f64,
    /// Range position above which price presses resistance
    pub resistance_position: f64,
    pub resistance_weight: f64,
    pub high_liquidity: f64,
    pub high_liquidity_weight: f64,
    pub mid_liquidity: f64,
    pub mid_liquidity_weight: f64,
}

impl Default for ContextScoringConfig {
    fn default() -> Self {
        Self {
            lookback: 20,
            strong_trend_pct: 10.0,
            strong_trend_weight: 0.30,
            mild_trend_weight: 0.15,
            bearish_trend_pct: -10.0,
            bearish_trend_weight: 0.10,
            support_position: 0.20,
            support_weight: 0.25,
            resistance_position: 0.90,
            resistance_weight: 0.20,
            high_liquidity: 500_000.0,
            high_liquidity_weight: 0.20,
            mid_liquidity: 100_000.0,
            mid_liquidity_weight: 0.10,
        }
    }
}

/// Scores how favourable the surrounding market is for a setup, in [0, 1].
#[derive(Debug, Clone, Default)]
pub struct ContextScorer {
    config: ContextScoringConfig,
}

impl ContextScorer {
    pub fn new(config: ContextScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ContextScoringConfig {
        &self.config
    }

    /// Windows shorter than the lookback only receive the liquidity term.
    pub fn score(&self, candles: &[Candle], context: &TokenContext) -> f64 {
        let mut score = 0.0;

        if self.config.lookback > 0 && candles.len() >= self.config.lookback {
            let recent = &candles[candles.len() - self.config.lookback..];
            score += self.trend_term(recent);
            score += self.position_term(recent);
        }

        score += self.liquidity_term(context.liquidity);

        score.clamp(0.0, 1.0)
    }

    fn trend_term(&self, recent: &[Candle]) -> f64 {
        let (Some(first), Some(last)) = (recent.first(), recent.last()) else {
            return 0.0;
        };
        if first.close == 0.0 {
            return 0.0;
        }

        let price_change = (last.close - first.close) / first.close * 100.0;
        if price_change > self.config.strong_trend_pct {
            self.config.strong_trend_weight
        } else if price_change > 0.0 {
            self.config.mild_trend_weight
        } else if price_change < self.config.bearish_trend_pct {
            self.config.bearish_trend_weight
        } else {
            0.0
        }
    }

    fn position_term(&self, recent: &[Candle]) -> f64 {
        let Some(last) = recent.last() else {
            return 0.0;
        };
        let recent_high = recent
            .iter()
            .map(|c| c.high)
            .fold(f64::NEG_INFINITY, f64::max);
        let recent_low = recent.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);

        if recent_high == recent_low {
            return 0.0;
        }

        let position = (last.close - recent_low) / (recent_high - recent_low);
        if position < self.config.support_position {
            self.config.support_weight
        } else if position > self.config.resistance_position {
            self.config.resistance_weight
        } else {
            0.0
        }
    }

    fn liquidity_term(&self, liquidity: f64) -> f64 {
        if liquidity > self.config.high_liquidity {
            self.config.high_liquidity_weight
        } else if liquidity > self.config.mid_liquidity {
            self.config.mid_liquidity_weight
        } else {
            0.0
        }
    }
}
