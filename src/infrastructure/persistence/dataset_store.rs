use super::write_atomic;
use crate::domain::ml::dataset::DatasetDocument;
use anyhow::{Context, Result};
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

/// Reads and writes training datasets as JSON.
pub struct DatasetStore;

impl DatasetStore {
    /// Accepts `{ "examples": [...], "metadata": {...} }` or a bare array.
    pub fn load(path: &Path) -> Result<DatasetDocument> {
        let file =
            fs::File::open(path).with_context(|| format!("Failed to open dataset {:?}", path))?;
        let raw: serde_json::Value = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse dataset {:?}", path))?;
        let document = DatasetDocument::from_value(raw)
            .with_context(|| format!("Invalid dataset {:?}", path))?;

        info!(
            "Loaded {} examples from {:?}",
            document.examples.len(),
            path
        );
        Ok(document)
    }

    /// Always writes the wrapped form, keeping metadata when present.
    pub fn save(path: &Path, document: &DatasetDocument) -> Result<()> {
        let content = serde_json::to_vec(document).context("Failed to serialize dataset")?;
        write_atomic(path, &content)?;

        info!("Saved {} examples to {:?}", document.examples.len(), path);
        Ok(())
    }

    /// Default output name next to the input: `data.json` -> `data_with_patterns.json`.
    pub fn enriched_path(input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string());
        input.with_file_name(format!("{}_with_patterns.json", stem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_dir() -> PathBuf {
        let unique_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "snipeml_test_{}_{}_{}_dataset",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0),
            unique_id
        ));
        fs::create_dir_all(&dir).expect("Failed to create test temp dir");
        dir
    }

    const EXAMPLE: &str = r#"{"candles":[{"open":1,"high":2,"low":0.5,"close":1.5,"volume":10}],
        "context":{"liquidity":1,"marketCap":2,"holders":3,"age":4,"volume24h":5},
        "indicators":{"rsi":50,"macd":0,"ema_fast":1,"ema_slow":1,"bbands_width":0.1},
        "labels":{"profitable":true,"max_profit":2.0,"rug_risk":false},
        "mint":"abc"}"#;

    #[test]
    fn test_bare_array_is_rewritten_wrapped() {
        let dir = temp_dir();
        let input = dir.join("data.json");
        fs::write(&input, format!("[{}]", EXAMPLE)).unwrap();

        let document = DatasetStore::load(&input).unwrap();
        assert_eq!(document.examples.len(), 1);

        let output = DatasetStore::enriched_path(&input);
        assert_eq!(output, dir.join("data_with_patterns.json"));
        DatasetStore::save(&output, &document).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert!(raw["examples"].is_array());
        assert_eq!(raw["examples"][0]["mint"], "abc");
        assert!(raw.get("metadata").is_none());

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_metadata_survives_roundtrip() {
        let dir = temp_dir();
        let input = dir.join("merged.json");
        fs::write(
            &input,
            format!(
                r#"{{"examples":[{}],"metadata":{{"total_examples":1,"source":"merge","created":"2024-01-01"}}}}"#,
                EXAMPLE
            ),
        )
        .unwrap();

        let document = DatasetStore::load(&input).unwrap();
        DatasetStore::save(&input, &document).unwrap();
        let reloaded = DatasetStore::load(&input).unwrap();

        let meta = reloaded.metadata.unwrap();
        assert_eq!(meta.source.as_deref(), Some("merge"));
        assert_eq!(meta.extra["created"], "2024-01-01");

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_bad_field_error_names_example() {
        let dir = temp_dir();
        let input = dir.join("bad.json");
        let bad = EXAMPLE.replace(r#""profitable":true"#, r#""profitable":"yes""#);
        fs::write(&input, format!("[{},{},{}]", EXAMPLE, EXAMPLE, bad)).unwrap();

        let err = DatasetStore::load(&input).unwrap_err();
        let chain = format!("{:#}", err);
        assert!(chain.contains("examples[2].labels"), "got {}", chain);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = temp_dir();
        assert!(DatasetStore::load(&dir.join("nope.json")).is_err());
        fs::remove_dir_all(dir).ok();
    }
}
