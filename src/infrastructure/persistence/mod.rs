pub mod dataset_store;
pub mod processed_writer;
pub mod scaler_store;

pub use dataset_store::DatasetStore;
pub use processed_writer::ProcessedSplitWriter;
pub use scaler_store::ScalerStore;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Atomic write: write to temp file then rename
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content)
        .with_context(|| format!("Failed to write temp file {:?}", temp_path))?;
    fs::rename(&temp_path, path).with_context(|| format!("Failed to rename to {:?}", path))?;
    Ok(())
}
