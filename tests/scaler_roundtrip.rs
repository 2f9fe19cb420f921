mod common;

use ndarray::Array2;
use proptest::prelude::*;
use snipeml::application::ml::feature_assembler::FeatureAssembler;
use snipeml::application::ml::scaler_pipeline::ScalerPipeline;
use snipeml::domain::ml::scaler_params::{ScalerDocument, ScalerParams};
use snipeml::infrastructure::persistence::ScalerStore;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_dir() -> PathBuf {
    let unique_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "snipeml_test_{}_{}_{}_roundtrip",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0),
        unique_id
    ));
    std::fs::create_dir_all(&dir).expect("Failed to create test temp dir");
    dir
}

fn fitted() -> ScalerPipeline {
    let batch = FeatureAssembler::new()
        .assemble_batch(&common::dataset(25, 16))
        .unwrap();
    ScalerPipeline::fit(&batch).unwrap()
}

fn assert_params_close(a: &ScalerParams, b: &ScalerParams) {
    assert_eq!(a.kind(), b.kind());
    assert_eq!(a.n_features(), b.n_features());
    for (x, y) in a.offset().iter().zip(b.offset()) {
        assert!((x - y).abs() < 1e-6, "offset {} vs {}", x, y);
    }
    for (x, y) in a.scale().iter().zip(b.scale()) {
        assert!((x - y).abs() < 1e-6, "scale {} vs {}", x, y);
    }
}

#[test]
fn test_export_import_preserves_parameters() {
    let original = fitted();
    let json = serde_json::to_string(&original.export()).unwrap();
    let document: ScalerDocument = serde_json::from_str(&json).unwrap();
    let restored = ScalerPipeline::import(document).unwrap();

    assert_params_close(original.candle_scaler(), restored.candle_scaler());
    assert_params_close(original.context_scaler(), restored.context_scaler());
    assert_params_close(original.indicator_scaler(), restored.indicator_scaler());

    assert_eq!(restored.candle_scaler().kind(), "RobustScaler");
    assert_eq!(restored.context_scaler().kind(), "StandardScaler");
    assert_eq!(restored.indicator_scaler().kind(), "StandardScaler");
}

#[test]
fn test_restored_scalers_transform_identically() {
    let original = fitted();
    let dir = temp_dir();
    let store = ScalerStore::new(dir.join("scalers.json"));
    store.save(&original).unwrap();
    let restored = store.load().unwrap();

    let example = common::example(99, 16, true);
    let assembled = FeatureAssembler::new().assemble_example(&example, 0).unwrap();
    let a = original.transform(&assembled).unwrap();
    let b = restored.transform(&assembled).unwrap();

    for (x, y) in a.candles.iter().zip(b.candles.iter()) {
        assert!((x - y).abs() < 1e-6);
    }
    for (x, y) in a.combined.iter().zip(b.combined.iter()) {
        assert!((x - y).abs() < 1e-6);
    }

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_import_accepts_trailing_underscore_field_names() {
    let json = r#"{
        "candle_scaler": {"type": "RobustScaler", "center_": [1, 1, 1, 1, 100],
                          "scale_": [0.5, 0.5, 0.5, 0.5, 0], "n_features_in_": 5},
        "context_scaler": {"type": "StandardScaler", "mean_": [0, 0, 0, 0, 0],
                           "scale_": [1, 1, 1, 1, 1], "var_": [1, 1, 1, 1, 1],
                           "n_features_in_": 5},
        "indicator_scaler": {"type": "StandardScaler", "mean_": [50, 0, 1, 1, 0.1],
                             "scale_": [10, 1, 1, 1, 0.1], "n_features_in_": 5}
    }"#;
    let document: ScalerDocument = serde_json::from_str(json).unwrap();
    let pipeline = ScalerPipeline::import(document).unwrap();

    // zero stored scale is replaced by 1
    assert_eq!(pipeline.candle_scaler().scale()[4], 1.0);
    let scaled = pipeline.transform_indicators(&[60.0, 0.0, 1.0, 1.0, 0.3]).unwrap();
    assert!((scaled[0] - 1.0).abs() < 1e-12);
    assert!((scaled[4] - 2.0).abs() < 1e-12);
}

#[test]
fn test_import_rejects_wrong_widths() {
    let mut document = fitted().export();
    if let ScalerParams::Standard(p) = &mut document.context_scaler {
        p.mean.pop();
    }
    assert!(ScalerPipeline::import(document).is_err());
}

fn reimported(pipeline: &ScalerPipeline) -> ScalerPipeline {
    let json = serde_json::to_string_pretty(&pipeline.export()).unwrap();
    ScalerPipeline::import(serde_json::from_str(&json).unwrap()).unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * a.abs().max(1.0)
}

proptest! {
    #[test]
    fn prop_reimported_pipeline_matches_on_any_row(
        candle_rows in prop::collection::vec(prop::array::uniform5(-1e6..1e6f64), 1..8),
        context in prop::array::uniform5(-1e9..1e9f64),
        indicators in prop::array::uniform5(-1e3..1e3f64),
    ) {
        let original = fitted();
        let restored = reimported(&original);

        let flat: Vec<f64> = candle_rows.iter().flatten().copied().collect();
        let candles = Array2::from_shape_vec((candle_rows.len(), 5), flat).unwrap();
        let a = original.transform_candles(candles.view()).unwrap();
        let b = restored.transform_candles(candles.view()).unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            prop_assert!(close(*x, *y), "candle {} vs {}", x, y);
        }

        let a = original.transform_context(&context).unwrap();
        let b = restored.transform_context(&context).unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            prop_assert!(close(*x, *y), "context {} vs {}", x, y);
        }

        let a = original.transform_indicators(&indicators).unwrap();
        let b = restored.transform_indicators(&indicators).unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            prop_assert!(close(*x, *y), "indicator {} vs {}", x, y);
        }
    }
}
