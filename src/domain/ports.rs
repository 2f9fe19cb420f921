use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

/// Raw outputs of the three model heads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    /// Probability in [0, 1]
    pub profitable: f64,
    /// Regression head, unbounded
    pub max_profit: f64,
    /// Probability in [0, 1]
    pub rug_risk: f64,
}

impl ModelOutput {
    pub fn new(profitable: f64, max_profit: f64, rug_risk: f64) -> Self {
        Self {
            profitable,
            max_profit,
            rug_risk,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.profitable.is_finite() && self.max_profit.is_finite() && self.rug_risk.is_finite()
    }
}

/// Interface for the trained model.
///
/// Treated as an opaque deterministic transform from scaled tensors to head
/// outputs. Implementations must be safe to share across threads.
pub trait ModelPredictor: Send + Sync {
    /// `candles` is the scaled `W × 5` window, `combined` the 18 combined
    /// features (context and indicators scaled, patterns raw).
    fn predict(&self, candles: ArrayView2<f64>, combined: &[f64]) -> Result<ModelOutput, String>;

    /// Get model name/type
    fn name(&self) -> &str;
}
