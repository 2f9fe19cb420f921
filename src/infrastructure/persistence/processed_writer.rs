use super::write_atomic;
use crate::application::ml::preprocessor::ProcessedSplit;
use crate::application::ml::scaler_pipeline::ScaledFeatures;
use crate::domain::ml::dataset::Labels;
use crate::domain::ml::feature_registry::{
    self, CANDLE_FIELDS, CANDLE_WIDTH, COMBINED_WIDTH,
};
use anyhow::{Context, Result, bail};
use ndarray::Array2;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

pub const LABEL_COLUMNS: &[&str] = &["profitable", "max_profit", "rug_risk"];

/// Header row for a split with the given window length.
pub fn header(window: usize) -> Vec<String> {
    let mut columns = Vec::with_capacity(window * CANDLE_WIDTH + COMBINED_WIDTH + 3);
    for t in 0..window {
        for field in CANDLE_FIELDS {
            columns.push(format!("c{}_{}", t, field));
        }
    }
    columns.extend(
        feature_registry::combined_feature_names()
            .into_iter()
            .map(String::from),
    );
    columns.extend(LABEL_COLUMNS.iter().map(|c| c.to_string()));
    columns
}

/// Writes processed splits as `train.csv`, `val.csv` and `test.csv`, one row
/// per example: flattened scaled candles, combined features, labels.
pub struct ProcessedSplitWriter {
    output_dir: PathBuf,
}

impl ProcessedSplitWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn path_for(&self, split: &str) -> PathBuf {
        self.output_dir.join(format!("{}.csv", split))
    }

    pub fn write(&self, split: &ProcessedSplit, window: usize) -> Result<PathBuf> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        wtr.write_record(header(window))
            .context("Failed to write CSV header")?;

        for (features, labels) in split.features.iter().zip(split.labels.iter()) {
            if features.candles.nrows() != window {
                bail!(
                    "{} split row has window {} but header expects {}",
                    split.name,
                    features.candles.nrows(),
                    window
                );
            }
            let row = features
                .candles
                .iter()
                .chain(features.combined.iter())
                .copied()
                .chain(labels.to_array())
                .map(|v| v.to_string());
            wtr.write_record(row).context("Failed to write CSV row")?;
        }

        let content = wtr
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e))?;
        let path = self.path_for(split.name);
        write_atomic(&path, &content)?;

        info!("Saved {} {} rows to {:?}", split.len(), split.name, path);
        Ok(path)
    }
}

/// Reads a split written by [`ProcessedSplitWriter`]. The window length is
/// recovered from the column count.
pub fn read_split(path: &Path, name: &'static str) -> Result<ProcessedSplit> {
    let file = fs::File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let mut rdr = csv::Reader::from_reader(BufReader::new(file));

    let n_columns = rdr.headers().context("Failed to read CSV header")?.len();
    let fixed = COMBINED_WIDTH + LABEL_COLUMNS.len();
    if n_columns < fixed || (n_columns - fixed) % CANDLE_WIDTH != 0 {
        bail!("Unexpected column count {} in {:?}", n_columns, path);
    }
    let window = (n_columns - fixed) / CANDLE_WIDTH;
    let candle_values = window * CANDLE_WIDTH;

    let mut features = Vec::new();
    let mut labels = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read row {}", i))?;
        let values = record
            .iter()
            .map(|v| v.parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
            .with_context(|| format!("Non-numeric value in row {}", i))?;
        if values.len() != n_columns {
            bail!("Row {} has {} columns, expected {}", i, values.len(), n_columns);
        }

        let candles = Array2::from_shape_vec((window, CANDLE_WIDTH), values[..candle_values].to_vec())
            .context("Failed to reshape candle columns")?;
        let mut combined = [0.0; COMBINED_WIDTH];
        combined.copy_from_slice(&values[candle_values..candle_values + COMBINED_WIDTH]);
        let label = &values[candle_values + COMBINED_WIDTH..];

        features.push(ScaledFeatures { candles, combined });
        labels.push(Labels {
            profitable: label[0] >= 0.5,
            max_profit: label[1],
            rug_risk: label[2] >= 0.5,
        });
    }

    Ok(ProcessedSplit {
        name,
        indices: (0..features.len()).collect(),
        features,
        labels,
    })
}
