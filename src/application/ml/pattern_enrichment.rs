use super::pattern_detector::CandlePatternDetector;
use crate::domain::errors::FeatureResult;
use crate::domain::market::{Candle, TokenContext};
use crate::domain::ml::dataset::TrainingExample;
use crate::domain::ml::patterns::PatternFeatures;
use rayon::prelude::*;
use tracing::info;

/// Pattern occurrence counts over an enriched dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternStats {
    pub total: usize,
    /// Examples that already carried a `patterns` object before enrichment
    pub replaced: usize,
    pub bullish_pins: usize,
    pub bearish_pins: usize,
    pub bullish_engulfing: usize,
    pub bearish_engulfing: usize,
}

impl PatternStats {
    fn record(&mut self, patterns: &PatternFeatures) {
        self.total += 1;
        self.bullish_pins += patterns.has_bullish_pin as usize;
        self.bearish_pins += patterns.has_bearish_pin as usize;
        self.bullish_engulfing += patterns.has_bullish_engulfing as usize;
        self.bearish_engulfing += patterns.has_bearish_engulfing as usize;
    }

    /// Share of examples, in percent.
    pub fn percent(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64 * 100.0
        }
    }
}

/// Recomputes `patterns` for every example of a dataset from its own candles.
#[derive(Debug, Clone, Default)]
pub struct PatternEnricher {
    detector: CandlePatternDetector,
}

impl PatternEnricher {
    pub fn new(detector: CandlePatternDetector) -> Self {
        Self { detector }
    }

    /// Patterns for one example. Windows shorter than two candles yield the
    /// default; only liquidity is read from the context.
    pub fn patterns_for(&self, example: &TrainingExample) -> FeatureResult<PatternFeatures> {
        let candles = example
            .candles
            .iter()
            .enumerate()
            .map(|(i, c)| c.to_candle(i))
            .collect::<FeatureResult<Vec<Candle>>>()?;
        let context = TokenContext {
            liquidity: example
                .context
                .as_ref()
                .and_then(|c| c.liquidity)
                .unwrap_or(0.0),
            ..Default::default()
        };
        Ok(self.detector.detect(&candles, &context))
    }

    /// Computes all patterns in parallel, then writes them back in order.
    /// Nothing is modified if any example fails.
    pub fn enrich(&self, examples: &mut [TrainingExample]) -> FeatureResult<PatternStats> {
        let computed = examples
            .par_iter()
            .map(|example| self.patterns_for(example))
            .collect::<FeatureResult<Vec<_>>>()?;

        let mut stats = PatternStats::default();
        for (example, patterns) in examples.iter_mut().zip(computed) {
            if example.patterns.is_some() {
                stats.replaced += 1;
            }
            stats.record(&patterns);
            example.patterns = Some(patterns);
        }

        info!(
            "Enriched {} examples ({} already had patterns)",
            stats.total, stats.replaced
        );
        Ok(stats)
    }
}
