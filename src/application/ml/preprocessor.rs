use super::dataset_split::{DatasetSplit, DatasetSplitter};
use super::feature_assembler::{FeatureAssembler, FeatureBatch};
use super::scaler_pipeline::{ScaledFeatures, ScalerPipeline};
use crate::domain::errors::{FeatureError, FeatureResult};
use crate::domain::ml::dataset::{Labels, TrainingExample};
use tracing::{info, warn};

/// One scaled partition with its targets, rows aligned.
#[derive(Debug, Clone)]
pub struct ProcessedSplit {
    pub name: &'static str,
    pub indices: Vec<usize>,
    pub features: Vec<ScaledFeatures>,
    pub labels: Vec<Labels>,
}

impl ProcessedSplit {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn profitable_count(&self) -> usize {
        self.labels.iter().filter(|l| l.profitable).count()
    }
}

#[derive(Debug, Clone)]
pub struct PreprocessOutput {
    pub window: usize,
    pub scalers: ScalerPipeline,
    pub train: ProcessedSplit,
    pub val: ProcessedSplit,
    pub test: ProcessedSplit,
    pub pattern_fallbacks: usize,
}

impl PreprocessOutput {
    pub fn splits(&self) -> [&ProcessedSplit; 3] {
        [&self.train, &self.val, &self.test]
    }
}

/// Offline pipeline from a raw dataset to scaled, split model inputs.
///
/// Scalers are fitted on the training partition only and then applied
/// unchanged to validation and test.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    assembler: FeatureAssembler,
    splitter: DatasetSplitter,
}

impl Preprocessor {
    pub fn new(assembler: FeatureAssembler, splitter: DatasetSplitter) -> Self {
        Self {
            assembler,
            splitter,
        }
    }

    pub fn splitter(&self) -> &DatasetSplitter {
        &self.splitter
    }

    pub fn run(&self, examples: &[TrainingExample]) -> FeatureResult<PreprocessOutput> {
        let labels = examples
            .iter()
            .enumerate()
            .map(|(i, e)| e.labels(&format!("examples[{}]", i)))
            .collect::<FeatureResult<Vec<Labels>>>()?;

        let batch = self.assembler.assemble_batch(examples)?;
        let window = batch.uniform_window()?;
        if batch.pattern_fallbacks == batch.len() {
            warn!("No example carries pattern features, pattern columns will be all zero");
        }

        let profitable: Vec<bool> = labels.iter().map(|l| l.profitable).collect();
        let split = self.splitter.split(&profitable);
        info!(
            "Split {} examples: train={}, val={}, test={}",
            split.total(),
            split.train.len(),
            split.val.len(),
            split.test.len()
        );

        let train_batch = batch.select(&split.train);
        if train_batch.is_empty() {
            return Err(FeatureError::InsufficientData {
                required: 2,
                actual: 0,
            });
        }
        let scalers = ScalerPipeline::fit(&train_batch)?;

        let DatasetSplit { train, val, test } = split;
        let output = PreprocessOutput {
            window,
            train: Self::process("train", train, &batch, &labels, &scalers)?,
            val: Self::process("val", val, &batch, &labels, &scalers)?,
            test: Self::process("test", test, &batch, &labels, &scalers)?,
            scalers,
            pattern_fallbacks: batch.pattern_fallbacks,
        };

        for split in output.splits() {
            info!(
                "{} profitable: {}/{}",
                split.name,
                split.profitable_count(),
                split.len()
            );
        }
        Ok(output)
    }

    fn process(
        name: &'static str,
        indices: Vec<usize>,
        batch: &FeatureBatch,
        labels: &[Labels],
        scalers: &ScalerPipeline,
    ) -> FeatureResult<ProcessedSplit> {
        let features = scalers.transform_batch(&batch.select(&indices))?;
        let labels = indices.iter().map(|&i| labels[i]).collect();
        Ok(ProcessedSplit {
            name,
            indices,
            features,
            labels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::{Candle, IndicatorSet, TokenContext};
    use crate::domain::ml::dataset::{ContextRecord, IndicatorRecord};

    fn example(i: usize, window: usize) -> TrainingExample {
        let base = 1.0 + i as f64 * 0.1;
        TrainingExample {
            candles: (0..window)
                .map(|t| {
                    let p = base + t as f64 * 0.01;
                    Candle::new(p, p + 0.02, p - 0.02, p + 0.01, 50.0 + i as f64).into()
                })
                .collect(),
            context: Some(ContextRecord::from(TokenContext::from_array([
                1000.0 * base,
                5000.0 * base,
                100.0 + i as f64,
                1.0 + (i % 7) as f64,
                200.0 * base,
            ]))),
            indicators: Some(IndicatorRecord::from(IndicatorSet::from_array([
                30.0 + (i % 40) as f64,
                0.01 * base,
                base,
                base * 0.99,
                0.02 + (i % 3) as f64 * 0.01,
            ]))),
            patterns: None,
            labels: Some(Labels {
                profitable: i % 3 == 0,
                max_profit: base,
                rug_risk: i % 5 == 0,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_run_splits_and_fits_on_train_only() {
        let examples: Vec<TrainingExample> = (0..60).map(|i| example(i, 10)).collect();
        let output = Preprocessor::default().run(&examples).unwrap();

        assert_eq!(output.window, 10);
        assert_eq!(output.pattern_fallbacks, 60);
        assert_eq!(
            output.train.len() + output.val.len() + output.test.len(),
            60
        );

        // Refitting on the training rows reproduces the stored scalers
        let batch = FeatureAssembler::new().assemble_batch(&examples).unwrap();
        let refit = ScalerPipeline::fit(&batch.select(&output.train.indices)).unwrap();
        assert_eq!(refit, output.scalers);

        // Fitting on everything gives different statistics
        let leaked = ScalerPipeline::fit(&batch).unwrap();
        assert_ne!(leaked, output.scalers);
    }

    #[test]
    fn test_rows_and_labels_stay_aligned() {
        let examples: Vec<TrainingExample> = (0..30).map(|i| example(i, 5)).collect();
        let output = Preprocessor::default().run(&examples).unwrap();

        for split in output.splits() {
            assert_eq!(split.features.len(), split.labels.len());
            for (k, &i) in split.indices.iter().enumerate() {
                assert_eq!(split.labels[k], examples[i].labels.unwrap());
            }
        }
    }

    #[test]
    fn test_missing_labels_abort() {
        let mut examples: Vec<TrainingExample> = (0..10).map(|i| example(i, 5)).collect();
        examples[6].labels = None;
        match Preprocessor::default().run(&examples) {
            Err(FeatureError::MissingField { field }) => assert_eq!(field, "examples[6].labels"),
            other => panic!("Expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_ragged_windows_rejected() {
        let mut examples: Vec<TrainingExample> = (0..10).map(|i| example(i, 5)).collect();
        examples[2] = example(2, 6);
        assert!(matches!(
            Preprocessor::default().run(&examples),
            Err(FeatureError::Shape(_))
        ));
    }
}
