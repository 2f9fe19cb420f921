//! Line-oriented scoring loop.
//!
//! One JSON request per input line, one JSON response per output line, in
//! order. Every failure is converted into an in-band response carrying the
//! fail-closed defaults; only end of input (or a broken output stream) stops
//! the loop.

use super::feature_assembler::FeatureAssembler;
use super::scaler_pipeline::ScalerPipeline;
use crate::domain::errors::{FeatureError, FeatureResult};
use crate::domain::market::{Candle, IndicatorSet, TokenContext};
use crate::domain::ml::feature_registry::{
    CANDLE_WIDTH, CONTEXT_WIDTH, INDICATOR_WIDTH, PATTERN_WIDTH,
};
use crate::domain::ports::{ModelOutput, ModelPredictor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Pattern entries may be sent as numbers or as booleans.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlexNumber {
    Number(f64),
    Flag(bool),
}

impl FlexNumber {
    pub fn value(self) -> f64 {
        match self {
            FlexNumber::Number(v) => v,
            FlexNumber::Flag(true) => 1.0,
            FlexNumber::Flag(false) => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceRequest {
    /// `window × 5` rows of open, high, low, close, volume
    pub candles: Vec<Vec<f64>>,
    pub context: Vec<f64>,
    pub indicators: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<Vec<FlexNumber>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub profitable: f64,
    pub max_profit: f64,
    pub rug_risk: f64,
    pub confidence: f64,
}

impl InferenceResponse {
    /// Conservative answer: not profitable, certain rug, no confidence.
    pub fn fail_closed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            profitable: 0.0,
            max_profit: 0.0,
            rug_risk: 1.0,
            confidence: 0.0,
        }
    }

    pub fn from_output(output: ModelOutput) -> Self {
        Self {
            error: None,
            profitable: output.profitable,
            max_profit: output.max_profit,
            rug_risk: output.rug_risk,
            confidence: confidence(output.profitable, output.rug_risk),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Mean distance of the two probability heads from the 0.5 decision boundary,
/// rescaled to [0, 1].
pub fn confidence(profitable: f64, rug_risk: f64) -> f64 {
    ((profitable - 0.5).abs() * 2.0 + (rug_risk - 0.5).abs() * 2.0) / 2.0
}

/// Counters reported when the input stream ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeStats {
    pub processed: usize,
    pub failed: usize,
}

fn fixed<const N: usize>(values: &[f64], name: &str) -> FeatureResult<[f64; N]> {
    values.try_into().map_err(|_| {
        FeatureError::Shape(format!(
            "expected {} shape ({},), got ({},)",
            name,
            N,
            values.len()
        ))
    })
}

fn parse_candles(rows: &[Vec<f64>]) -> FeatureResult<Vec<Candle>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let row: [f64; CANDLE_WIDTH] = row.as_slice().try_into().map_err(|_| {
                FeatureError::Shape(format!(
                    "candle row {} has {} values, expected {}",
                    i,
                    row.len(),
                    CANDLE_WIDTH
                ))
            })?;
            Ok(Candle::from_row(row))
        })
        .collect()
}

/// Scores requests against an immutable model and scaler set.
///
/// Both collaborators are loaded once at startup. A deployment running
/// several workers gives each its own service instance.
pub struct InferenceService {
    predictor: Arc<dyn ModelPredictor>,
    scalers: ScalerPipeline,
    assembler: FeatureAssembler,
    warned_missing_patterns: AtomicBool,
}

impl InferenceService {
    pub fn new(predictor: Arc<dyn ModelPredictor>, scalers: ScalerPipeline, window: usize) -> Self {
        Self {
            predictor,
            scalers,
            assembler: FeatureAssembler::with_window(window),
            warned_missing_patterns: AtomicBool::new(false),
        }
    }

    pub fn window(&self) -> Option<usize> {
        self.assembler.window()
    }

    pub fn model_name(&self) -> &str {
        self.predictor.name()
    }

    /// Validate, assemble, scale and score one request.
    pub fn predict(&self, request: &InferenceRequest) -> FeatureResult<ModelOutput> {
        let candles = parse_candles(&request.candles)?;
        let context = TokenContext::from_array(fixed::<CONTEXT_WIDTH>(&request.context, "context")?);
        let indicators = IndicatorSet::from_array(fixed::<INDICATOR_WIDTH>(
            &request.indicators,
            "indicators",
        )?);
        let patterns = match &request.patterns {
            Some(values) => {
                let values: Vec<f64> = values.iter().map(|v| v.value()).collect();
                Some(fixed::<PATTERN_WIDTH>(&values, "patterns")?)
            }
            None => {
                if !self.warned_missing_patterns.swap(true, Ordering::Relaxed) {
                    warn!("Request without patterns, using zero pattern vector");
                }
                None
            }
        };

        let assembled = self
            .assembler
            .assemble(&candles, &context, &indicators, patterns)?;
        let scaled = self.scalers.transform(&assembled)?;

        let output = self
            .predictor
            .predict(scaled.candles.view(), &scaled.combined)
            .map_err(FeatureError::ModelInvocation)?;
        if !output.is_finite() {
            return Err(FeatureError::ModelInvocation(format!(
                "non-finite model output: {:?}",
                output
            )));
        }
        Ok(output)
    }

    /// Turns one raw input line into exactly one response.
    pub fn handle_line(&self, line: &str) -> InferenceResponse {
        let value: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => return InferenceResponse::fail_closed(format!("Invalid JSON: {}", e)),
        };

        let result = InferenceRequest::deserialize(value)
            .map_err(FeatureError::from)
            .and_then(|request| self.predict(&request));

        match result {
            Ok(output) => InferenceResponse::from_output(output),
            Err(e) => InferenceResponse::fail_closed(format!("Inference failed: {}", e)),
        }
    }

    /// Serves until end of input. Returns an error only when writing a
    /// response or reading the input stream fails.
    pub fn run<R: BufRead, W: Write>(&self, mut input: R, mut output: W) -> io::Result<ServeStats> {
        info!(
            "Listening for inference requests (model: {})",
            self.predictor.name()
        );

        let mut stats = ServeStats::default();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                break;
            }

            let response = match std::str::from_utf8(&buf) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    self.handle_line(line)
                }
                Err(e) => InferenceResponse::fail_closed(format!("Invalid JSON: {}", e)),
            };

            stats.processed += 1;
            if let Some(error) = &response.error {
                stats.failed += 1;
                warn!("Request {} failed: {}", stats.processed, error);
            } else {
                debug!(
                    "Request {} scored: profitable={:.4} rug_risk={:.4}",
                    stats.processed, response.profitable, response.rug_risk
                );
            }

            let encoded = serde_json::to_string(&response).map_err(io::Error::other)?;
            writeln!(output, "{}", encoded)?;
            output.flush()?;
        }

        info!(
            "Input closed after {} requests ({} failed)",
            stats.processed, stats.failed
        );
        Ok(stats)
    }
}
