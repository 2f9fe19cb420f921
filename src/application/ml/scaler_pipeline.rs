use super::feature_assembler::{AssembledFeatures, FeatureBatch};
use crate::domain::errors::{FeatureError, FeatureResult};
use crate::domain::ml::feature_registry::{
    self, CANDLE_WIDTH, COMBINED_WIDTH, CONTEXT_WIDTH, INDICATOR_WIDTH,
};
use crate::domain::ml::scaler_params::{
    RobustParams, ScalerDocument, ScalerParams, StandardParams,
};
use ndarray::{Array2, ArrayView1, ArrayView2};
use statrs::statistics::Statistics;
use tracing::{debug, info};

/// Minimum rows needed for a meaningful spread estimate.
const MIN_FIT_SAMPLES: usize = 2;

fn check_fit_input(data: &ArrayView2<f64>) -> FeatureResult<()> {
    if data.nrows() < MIN_FIT_SAMPLES {
        return Err(FeatureError::InsufficientData {
            required: MIN_FIT_SAMPLES,
            actual: data.nrows(),
        });
    }
    if data.ncols() == 0 {
        return Err(FeatureError::Shape("cannot fit on zero features".to_string()));
    }
    if let Some(f) = data
        .columns()
        .into_iter()
        .position(|col| col.iter().any(|v| !v.is_finite()))
    {
        return Err(FeatureError::Shape(format!(
            "non-finite value in feature column {}",
            f
        )));
    }
    Ok(())
}

/// Constant features get scale 1 so transforms never divide by zero.
fn non_zero(scale: f64) -> f64 {
    if scale == 0.0 { 1.0 } else { scale }
}

/// Quantile with linear interpolation between order statistics.
fn quantile_linear(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

fn sorted_column(col: ArrayView1<f64>) -> Vec<f64> {
    let mut values = col.to_vec();
    values.sort_by(f64::total_cmp);
    values
}

/// Per-feature median and interquartile range.
pub fn fit_robust(data: ArrayView2<f64>) -> FeatureResult<ScalerParams> {
    check_fit_input(&data)?;

    let mut center = Vec::with_capacity(data.ncols());
    let mut scale = Vec::with_capacity(data.ncols());
    for col in data.columns() {
        let sorted = sorted_column(col);
        center.push(quantile_linear(&sorted, 0.5));
        let iqr = quantile_linear(&sorted, 0.75) - quantile_linear(&sorted, 0.25);
        scale.push(non_zero(iqr));
    }

    Ok(ScalerParams::Robust(RobustParams {
        center,
        scale,
        n_features_in: data.ncols(),
    }))
}

/// Per-feature mean and population standard deviation.
pub fn fit_standard(data: ArrayView2<f64>) -> FeatureResult<ScalerParams> {
    check_fit_input(&data)?;

    let mut mean = Vec::with_capacity(data.ncols());
    let mut variance = Vec::with_capacity(data.ncols());
    let mut scale = Vec::with_capacity(data.ncols());
    for col in data.columns() {
        let m = col.iter().mean();
        let var = col.iter().population_variance();
        mean.push(m);
        variance.push(var);
        scale.push(non_zero(var.sqrt()));
    }

    Ok(ScalerParams::Standard(StandardParams {
        mean,
        scale,
        variance,
        n_features_in: data.ncols(),
    }))
}

/// Scaled tensors ready for the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledFeatures {
    pub candles: Array2<f64>,
    /// Scaled context ++ scaled indicators ++ raw patterns
    pub combined: [f64; COMBINED_WIDTH],
}

/// The three fitted scalers: robust over candle fields, standard over context
/// and over indicators. Pattern features pass through unscaled.
///
/// Immutable once built; serving loads it once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalerPipeline {
    candle: ScalerParams,
    context: ScalerParams,
    indicator: ScalerParams,
}

impl ScalerPipeline {
    /// Fits on the training split only.
    pub fn fit(train: &FeatureBatch) -> FeatureResult<Self> {
        let candles = train.stacked_candles()?;
        let context = train.context_matrix()?;
        let indicators = train.indicator_matrix()?;

        let pipeline = Self {
            candle: fit_robust(candles.view())?,
            context: fit_standard(context.view())?,
            indicator: fit_standard(indicators.view())?,
        };
        info!(
            "Fitted scalers on {} examples ({} candle rows)",
            train.len(),
            candles.nrows()
        );
        Ok(pipeline)
    }

    /// Imports a document, validating every scaler against the feature layout.
    pub fn import(document: ScalerDocument) -> FeatureResult<Self> {
        let candle = document.candle_scaler.validated("candle_scaler")?;
        let context = document.context_scaler.validated("context_scaler")?;
        let indicator = document.indicator_scaler.validated("indicator_scaler")?;

        for (params, expected) in [
            (&candle, CANDLE_WIDTH),
            (&context, CONTEXT_WIDTH),
            (&indicator, INDICATOR_WIDTH),
        ] {
            if params.n_features() != expected {
                return Err(FeatureError::DimensionMismatch {
                    expected,
                    actual: params.n_features(),
                });
            }
        }

        debug!(
            "Imported scalers: candle={}, context={}, indicator={}",
            candle.kind(),
            context.kind(),
            indicator.kind()
        );
        Ok(Self {
            candle,
            context,
            indicator,
        })
    }

    pub fn export(&self) -> ScalerDocument {
        ScalerDocument {
            candle_scaler: self.candle.clone(),
            context_scaler: self.context.clone(),
            indicator_scaler: self.indicator.clone(),
        }
    }

    pub fn candle_scaler(&self) -> &ScalerParams {
        &self.candle
    }

    pub fn context_scaler(&self) -> &ScalerParams {
        &self.context
    }

    pub fn indicator_scaler(&self) -> &ScalerParams {
        &self.indicator
    }

    pub fn transform_candles(&self, candles: ArrayView2<f64>) -> FeatureResult<Array2<f64>> {
        self.candle.transform(candles)
    }

    pub fn transform_context(&self, context: &[f64]) -> FeatureResult<[f64; CONTEXT_WIDTH]> {
        to_fixed(self.context.transform_row(context)?)
    }

    pub fn transform_indicators(
        &self,
        indicators: &[f64],
    ) -> FeatureResult<[f64; INDICATOR_WIDTH]> {
        to_fixed(self.indicator.transform_row(indicators)?)
    }

    pub fn transform(&self, features: &AssembledFeatures) -> FeatureResult<ScaledFeatures> {
        let candles = self.transform_candles(features.candles.view())?;
        let context = self.transform_context(&features.context)?;
        let indicators = self.transform_indicators(&features.indicators)?;

        Ok(ScaledFeatures {
            candles,
            combined: feature_registry::combine(&context, &indicators, &features.patterns),
        })
    }

    pub fn transform_batch(&self, batch: &FeatureBatch) -> FeatureResult<Vec<ScaledFeatures>> {
        batch.items.iter().map(|item| self.transform(item)).collect()
    }
}

fn to_fixed<const N: usize>(values: Vec<f64>) -> FeatureResult<[f64; N]> {
    let actual = values.len();
    values
        .try_into()
        .map_err(|_| FeatureError::DimensionMismatch {
            expected: N,
            actual,
        })
}
