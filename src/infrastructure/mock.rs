use crate::domain::ml::feature_registry::{COMBINED_WIDTH, CONTEXT_WIDTH, INDICATOR_WIDTH};
use crate::domain::ports::{ModelOutput, ModelPredictor};
use ndarray::ArrayView2;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
enum MockMode {
    Fixed(ModelOutput),
    /// profitable = 0.5, max_profit = sum of pattern block, rug_risk = 0.5
    Echo,
    Failing(String),
}

/// Stub model for tests and dry runs.
///
/// Records the inputs of the last call so tests can inspect exactly what the
/// model would have received.
#[derive(Debug)]
pub struct MockPredictor {
    mode: MockMode,
    calls: AtomicUsize,
    last_input: Mutex<Option<(Vec<f64>, Vec<f64>)>>,
}

impl MockPredictor {
    fn with_mode(mode: MockMode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
            last_input: Mutex::new(None),
        }
    }

    /// Always returns the same head outputs.
    pub fn fixed(profitable: f64, max_profit: f64, rug_risk: f64) -> Self {
        Self::with_mode(MockMode::Fixed(ModelOutput::new(
            profitable, max_profit, rug_risk,
        )))
    }

    pub fn echo() -> Self {
        Self::with_mode(MockMode::Echo)
    }

    /// Every call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_mode(MockMode::Failing(message.into()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Flattened candles and combined vector of the most recent call.
    pub fn last_input(&self) -> Option<(Vec<f64>, Vec<f64>)> {
        self.last_input.lock().ok().and_then(|guard| guard.clone())
    }
}

impl ModelPredictor for MockPredictor {
    fn predict(&self, candles: ArrayView2<f64>, combined: &[f64]) -> Result<ModelOutput, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_input.lock() {
            *guard = Some((candles.iter().copied().collect(), combined.to_vec()));
        }

        if combined.len() != COMBINED_WIDTH {
            return Err(format!(
                "expected {} combined features, got {}",
                COMBINED_WIDTH,
                combined.len()
            ));
        }

        match &self.mode {
            MockMode::Fixed(output) => Ok(*output),
            MockMode::Echo => {
                let patterns: f64 = combined[CONTEXT_WIDTH + INDICATOR_WIDTH..].iter().sum();
                Ok(ModelOutput::new(0.5, patterns, 0.5))
            }
            MockMode::Failing(message) => Err(message.clone()),
        }
    }

    fn name(&self) -> &str {
        "Mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_fixed_records_calls() {
        let mock = MockPredictor::fixed(0.7, 4.0, 0.05);
        let candles = Array2::<f64>::zeros((2, 5));
        let out = mock.predict(candles.view(), &[1.0; COMBINED_WIDTH]).unwrap();

        assert_eq!(out, ModelOutput::new(0.7, 4.0, 0.05));
        assert_eq!(mock.calls(), 1);
        let (c, combined) = mock.last_input().unwrap();
        assert_eq!(c.len(), 10);
        assert_eq!(combined.len(), COMBINED_WIDTH);
    }

    #[test]
    fn test_failing_and_width_check() {
        let candles = Array2::<f64>::zeros((1, 5));
        let failing = MockPredictor::failing("boom");
        assert_eq!(
            failing.predict(candles.view(), &[0.0; COMBINED_WIDTH]),
            Err("boom".to_string())
        );

        let echo = MockPredictor::echo();
        assert!(echo.predict(candles.view(), &[0.0; 3]).is_err());
    }
}
