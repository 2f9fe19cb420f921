use crate::domain::errors::FeatureError;
use crate::domain::ports::{ModelOutput, ModelPredictor};
use ndarray::ArrayView2;
use ort::session::Session;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

/// Two-input, three-output model served through ONNX Runtime.
///
/// Inputs are float32 `[1, W, 5]` candles and `[1, 18]` combined features.
/// Outputs are read in graph order: profitable probability, max profit,
/// rug probability.
pub struct OnnxPredictor {
    session: Mutex<Session>,
    model_path: PathBuf,
}

impl OnnxPredictor {
    pub fn load(model_path: impl AsRef<Path>) -> Result<Self, FeatureError> {
        let model_path = model_path.as_ref().to_path_buf();
        if !model_path.exists() {
            return Err(FeatureError::ModelLoad(format!(
                "ONNX model file not found at {:?}",
                model_path
            )));
        }

        let session = Session::builder()
            .map_err(|e| {
                FeatureError::ModelLoad(format!("Failed to create ONNX session builder: {}", e))
            })?
            .commit_from_file(&model_path)
            .map_err(|e| FeatureError::ModelLoad(format!("Failed to load ONNX model: {}", e)))?;

        info!("Successfully loaded ONNX model from {:?}", model_path);
        Ok(Self {
            session: Mutex::new(session),
            model_path,
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

fn first_value(data: &[f32], head: &str) -> Result<f64, String> {
    data.first()
        .map(|v| *v as f64)
        .ok_or_else(|| format!("Empty output for {}", head))
}

impl ModelPredictor for OnnxPredictor {
    fn predict(&self, candles: ArrayView2<f64>, combined: &[f64]) -> Result<ModelOutput, String> {
        let candle_shape = vec![1, candles.nrows(), candles.ncols()];
        let candle_data: Vec<f32> = candles.iter().map(|v| *v as f32).collect();
        let combined_shape = vec![1, combined.len()];
        let combined_data: Vec<f32> = combined.iter().map(|v| *v as f32).collect();

        let candle_value = ort::value::Value::from_array((candle_shape.as_slice(), candle_data))
            .map_err(|e| format!("Candle input creation failed: {}", e))?;
        let combined_value =
            ort::value::Value::from_array((combined_shape.as_slice(), combined_data))
                .map_err(|e| format!("Combined input creation failed: {}", e))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Mutex lock failed: {}", e))?;

        let inputs = ort::inputs![candle_value, combined_value];
        let outputs = session.run(inputs).map_err(|e| e.to_string())?;

        let mut heads = Vec::with_capacity(3);
        for ((_, value), head) in outputs
            .iter()
            .zip(["profitable", "max_profit", "rug_risk"])
        {
            let data = value
                .try_extract_tensor::<f32>()
                .map_err(|e| e.to_string())?;
            heads.push(first_value(data.1, head)?);
        }

        match heads.as_slice() {
            [profitable, max_profit, rug_risk] => {
                Ok(ModelOutput::new(*profitable, *max_profit, *rug_risk))
            }
            _ => Err(format!("Expected 3 model outputs, got {}", heads.len())),
        }
    }

    fn name(&self) -> &str {
        "ONNX Runtime"
    }
}
