use super::write_atomic;
use crate::application::ml::scaler_pipeline::ScalerPipeline;
use crate::domain::ml::scaler_params::ScalerDocument;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// JSON file holding the exported scaler document.
pub struct ScalerStore {
    file_path: PathBuf,
}

impl ScalerStore {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Reads and validates the document. Serving refuses to start on failure.
    pub fn load(&self) -> Result<ScalerPipeline> {
        let content = fs::read_to_string(&self.file_path)
            .with_context(|| format!("Failed to read scalers file {:?}", self.file_path))?;
        let document: ScalerDocument =
            serde_json::from_str(&content).context("Failed to parse scalers JSON")?;
        let pipeline = ScalerPipeline::import(document)
            .with_context(|| format!("Invalid scaler document {:?}", self.file_path))?;

        info!("Loaded scalers from {:?}", self.file_path);
        Ok(pipeline)
    }

    pub fn save(&self, pipeline: &ScalerPipeline) -> Result<()> {
        let content = serde_json::to_string_pretty(&pipeline.export())
            .context("Failed to serialize scalers")?;
        write_atomic(&self.file_path, content.as_bytes())?;

        info!("Saved scalers to {:?}", self.file_path);
        Ok(())
    }
}
