//! Fitted normalization parameters and their portable JSON document.
//!
//! Both strategies reduce to the same arithmetic at transform time,
//! `(x - offset[f]) / scale[f]`, where the offset is the median for the
//! robust strategy and the mean for the standard one.

use crate::domain::errors::{FeatureError, FeatureResult};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobustParams {
    #[serde(alias = "center_")]
    pub center: Vec<f64>,
    #[serde(alias = "scale_")]
    pub scale: Vec<f64>,
    #[serde(alias = "n_features_in_")]
    pub n_features_in: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardParams {
    #[serde(alias = "mean_")]
    pub mean: Vec<f64>,
    #[serde(alias = "scale_")]
    pub scale: Vec<f64>,
    #[serde(default, alias = "var_", skip_serializing_if = "Vec::is_empty")]
    pub variance: Vec<f64>,
    #[serde(alias = "n_features_in_")]
    pub n_features_in: usize,
}

/// Strategy tag plus parameter payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScalerParams {
    #[serde(rename = "RobustScaler", alias = "robust")]
    Robust(RobustParams),
    #[serde(rename = "StandardScaler", alias = "standard")]
    Standard(StandardParams),
}

impl ScalerParams {
    pub fn kind(&self) -> &'static str {
        match self {
            ScalerParams::Robust(_) => "RobustScaler",
            ScalerParams::Standard(_) => "StandardScaler",
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            ScalerParams::Robust(p) => p.n_features_in,
            ScalerParams::Standard(p) => p.n_features_in,
        }
    }

    /// Median or mean, depending on strategy.
    pub fn offset(&self) -> &[f64] {
        match self {
            ScalerParams::Robust(p) => &p.center,
            ScalerParams::Standard(p) => &p.mean,
        }
    }

    pub fn scale(&self) -> &[f64] {
        match self {
            ScalerParams::Robust(p) => &p.scale,
            ScalerParams::Standard(p) => &p.scale,
        }
    }

    fn scale_mut(&mut self) -> &mut Vec<f64> {
        match self {
            ScalerParams::Robust(p) => &mut p.scale,
            ScalerParams::Standard(p) => &mut p.scale,
        }
    }

    /// Checks a document produced elsewhere before it is used for serving.
    ///
    /// Lengths must agree with `n_features_in` and every value must be finite.
    /// A stored scale of exactly 0 is replaced by 1 so transforms never divide
    /// by zero.
    pub fn validated(mut self, name: &str) -> FeatureResult<Self> {
        let expected = self.n_features();
        if expected == 0 {
            return Err(FeatureError::Shape(format!(
                "{} records zero input features",
                name
            )));
        }

        let mut lengths = vec![self.offset().len(), self.scale().len()];
        if let ScalerParams::Standard(p) = &self
            && !p.variance.is_empty()
        {
            lengths.push(p.variance.len());
        }
        if let Some(&actual) = lengths.iter().find(|&&len| len != expected) {
            return Err(FeatureError::DimensionMismatch { expected, actual });
        }

        if self
            .offset()
            .iter()
            .chain(self.scale().iter())
            .any(|v| !v.is_finite())
        {
            return Err(FeatureError::Parse(format!(
                "{} contains non-finite parameters",
                name
            )));
        }

        for (f, s) in self.scale_mut().iter_mut().enumerate() {
            if *s == 0.0 {
                warn!(
                    "{}: stored scale for feature {} is zero, substituting 1.0",
                    name, f
                );
                *s = 1.0;
            }
        }

        Ok(self)
    }

    /// Input width and stored parameter lengths must all equal `n_features_in`,
    /// whether or not the params went through `validated`.
    fn check_width(&self, actual: usize) -> FeatureResult<()> {
        let expected = self.n_features();
        for len in [actual, self.offset().len(), self.scale().len()] {
            if len != expected {
                return Err(FeatureError::DimensionMismatch {
                    expected,
                    actual: len,
                });
            }
        }
        Ok(())
    }

    /// Scales one feature row.
    pub fn transform_row(&self, row: &[f64]) -> FeatureResult<Vec<f64>> {
        self.check_width(row.len())?;
        Ok(row
            .iter()
            .zip(self.offset().iter().zip(self.scale().iter()))
            .map(|(x, (o, s))| (x - o) / s)
            .collect())
    }

    /// Scales every row of a `samples × features` matrix.
    pub fn transform(&self, data: ArrayView2<f64>) -> FeatureResult<Array2<f64>> {
        self.check_width(data.ncols())?;
        let offset = self.offset();
        let scale = self.scale();

        let mut out = data.to_owned();
        for mut row in out.rows_mut() {
            for (f, value) in row.iter_mut().enumerate() {
                *value = (*value - offset[f]) / scale[f];
            }
        }
        Ok(out)
    }
}

/// Portable export of all three fitted scalers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerDocument {
    pub candle_scaler: ScalerParams,
    pub context_scaler: ScalerParams,
    pub indicator_scaler: ScalerParams,
}
