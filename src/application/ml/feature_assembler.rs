use crate::domain::errors::{FeatureError, FeatureResult};
use crate::domain::market::{Candle, IndicatorSet, TokenContext};
use crate::domain::ml::dataset::TrainingExample;
use crate::domain::ml::feature_registry::{
    self, CANDLE_WIDTH, COMBINED_WIDTH, CONTEXT_WIDTH, INDICATOR_WIDTH, PATTERN_WIDTH,
};
use ndarray::{Array2, Axis};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Unscaled model inputs for a single example or request.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledFeatures {
    /// `window × 5` in open, high, low, close, volume order
    pub candles: Array2<f64>,
    pub context: [f64; CONTEXT_WIDTH],
    pub indicators: [f64; INDICATOR_WIDTH],
    pub patterns: [f64; PATTERN_WIDTH],
    /// True when `patterns` was absent and zeros were substituted
    pub used_pattern_fallback: bool,
}

impl AssembledFeatures {
    pub fn window(&self) -> usize {
        self.candles.nrows()
    }

    /// context ++ indicators ++ patterns, unscaled.
    pub fn combined(&self) -> [f64; COMBINED_WIDTH] {
        feature_registry::combine(&self.context, &self.indicators, &self.patterns)
    }
}

/// Assembled examples of one dataset, in input order.
#[derive(Debug, Clone, Default)]
pub struct FeatureBatch {
    pub items: Vec<AssembledFeatures>,
    pub pattern_fallbacks: usize,
}

impl FeatureBatch {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Window length shared by every example. Tensors cannot be stacked otherwise.
    pub fn uniform_window(&self) -> FeatureResult<usize> {
        let Some(first) = self.items.first() else {
            return Err(FeatureError::Shape("empty batch has no window".to_string()));
        };
        let window = first.window();
        if let Some((i, item)) = self
            .items
            .iter()
            .enumerate()
            .find(|(_, item)| item.window() != window)
        {
            return Err(FeatureError::Shape(format!(
                "example {} has window {} but example 0 has {}",
                i,
                item.window(),
                window
            )));
        }
        Ok(window)
    }

    /// All timesteps of all examples stacked into `(Σ window) × 5`.
    pub fn stacked_candles(&self) -> FeatureResult<Array2<f64>> {
        if self.items.is_empty() {
            return Ok(Array2::zeros((0, CANDLE_WIDTH)));
        }
        let views: Vec<_> = self.items.iter().map(|item| item.candles.view()).collect();
        ndarray::concatenate(Axis(0), &views).map_err(|e| FeatureError::Shape(e.to_string()))
    }

    pub fn context_matrix(&self) -> FeatureResult<Array2<f64>> {
        rows_to_matrix(self.items.iter().map(|item| &item.context[..]), CONTEXT_WIDTH)
    }

    pub fn indicator_matrix(&self) -> FeatureResult<Array2<f64>> {
        rows_to_matrix(
            self.items.iter().map(|item| &item.indicators[..]),
            INDICATOR_WIDTH,
        )
    }

    /// Sub-batch in the order of `indices`.
    pub fn select(&self, indices: &[usize]) -> FeatureBatch {
        let items: Vec<AssembledFeatures> = indices
            .iter()
            .filter_map(|&i| self.items.get(i).cloned())
            .collect();
        let pattern_fallbacks = items.iter().filter(|i| i.used_pattern_fallback).count();
        FeatureBatch {
            items,
            pattern_fallbacks,
        }
    }
}

fn rows_to_matrix<'a>(
    rows: impl Iterator<Item = &'a [f64]>,
    width: usize,
) -> FeatureResult<Array2<f64>> {
    let flat: Vec<f64> = rows.flat_map(|r| r.iter().copied()).collect();
    let n = flat.len() / width;
    Array2::from_shape_vec((n, width), flat).map_err(|e| FeatureError::Shape(e.to_string()))
}

/// Candles into a `window × 5` matrix.
pub fn candles_to_matrix(candles: &[Candle]) -> FeatureResult<Array2<f64>> {
    let flat: Vec<f64> = candles.iter().flat_map(|c| c.to_row()).collect();
    Array2::from_shape_vec((candles.len(), CANDLE_WIDTH), flat)
        .map_err(|e| FeatureError::Shape(e.to_string()))
}

/// Validates raw example fields and lays them out as model inputs.
///
/// Offline datasets and live requests both go through [`FeatureAssembler::assemble`],
/// so the two paths produce identical vectors for identical raw values.
#[derive(Debug, Clone, Default)]
pub struct FeatureAssembler {
    window: Option<usize>,
}

impl FeatureAssembler {
    /// Accepts any non-empty window length.
    pub fn new() -> Self {
        Self { window: None }
    }

    /// Requires every window to have exactly `window` candles.
    pub fn with_window(window: usize) -> Self {
        Self {
            window: Some(window),
        }
    }

    pub fn window(&self) -> Option<usize> {
        self.window
    }

    pub fn assemble(
        &self,
        candles: &[Candle],
        context: &TokenContext,
        indicators: &IndicatorSet,
        patterns: Option<[f64; PATTERN_WIDTH]>,
    ) -> FeatureResult<AssembledFeatures> {
        if candles.is_empty() {
            return Err(FeatureError::Shape(
                "candle window length is zero".to_string(),
            ));
        }
        if let Some(expected) = self.window
            && candles.len() != expected
        {
            return Err(FeatureError::Shape(format!(
                "expected {} candles, got {}",
                expected,
                candles.len()
            )));
        }

        let used_pattern_fallback = patterns.is_none();
        Ok(AssembledFeatures {
            candles: candles_to_matrix(candles)?,
            context: context.to_array(),
            indicators: indicators.to_array(),
            patterns: patterns.unwrap_or([0.0; PATTERN_WIDTH]),
            used_pattern_fallback,
        })
    }

    /// `index` locates the example in its dataset for error messages.
    pub fn assemble_example(
        &self,
        example: &TrainingExample,
        index: usize,
    ) -> FeatureResult<AssembledFeatures> {
        let path = format!("examples[{}]", index);
        let candles = example.candles().map_err(|e| match e {
            FeatureError::Shape(msg) => FeatureError::Shape(format!("{}: {}", path, msg)),
            other => other,
        })?;
        let context = example.context(&path)?;
        let indicators = example.indicators(&path)?;
        let patterns = example.patterns.map(|p| p.to_vector());

        self.assemble(&candles, &context, &indicators, patterns)
    }

    /// Assembles every example in parallel, preserving order.
    ///
    /// Aborts on the first hard error. Examples without `patterns` get the
    /// zero fallback and are reported by a single warning for the batch.
    pub fn assemble_batch(&self, examples: &[TrainingExample]) -> FeatureResult<FeatureBatch> {
        let fallbacks = AtomicUsize::new(0);

        let items = examples
            .par_iter()
            .enumerate()
            .map(|(i, example)| -> FeatureResult<AssembledFeatures> {
                let assembled = self.assemble_example(example, i)?;
                if assembled.used_pattern_fallback {
                    fallbacks.fetch_add(1, Ordering::Relaxed);
                }
                Ok(assembled)
            })
            .collect::<FeatureResult<Vec<_>>>()?;

        let pattern_fallbacks = fallbacks.into_inner();
        if pattern_fallbacks > 0 {
            warn!(
                "{} of {} examples have no patterns, using zero pattern vector",
                pattern_fallbacks,
                examples.len()
            );
        }
        debug!("Assembled {} examples", items.len());

        Ok(FeatureBatch {
            items,
            pattern_fallbacks,
        })
    }
}
