use super::preprocessor::ProcessedSplit;
use crate::domain::errors::{FeatureError, FeatureResult};
use crate::domain::ports::{ModelOutput, ModelPredictor};
use std::fmt;
use tracing::debug;

/// Scores strictly above this count as a positive prediction.
pub const DECISION_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    pub fn from_scores(scores: &[f64], labels: &[bool]) -> Self {
        let mut m = Self::default();
        for (&score, &label) in scores.iter().zip(labels) {
            match (score > DECISION_THRESHOLD, label) {
                (true, true) => m.true_positive += 1,
                (true, false) => m.false_positive += 1,
                (false, false) => m.true_negative += 1,
                (false, true) => m.false_negative += 1,
            }
        }
        m
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    pub fn accuracy(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        (self.true_positive + self.true_negative) as f64 / self.total() as f64
    }

    pub fn precision(&self) -> Option<f64> {
        let predicted = self.true_positive + self.false_positive;
        (predicted > 0).then(|| self.true_positive as f64 / predicted as f64)
    }

    pub fn recall(&self) -> Option<f64> {
        let actual = self.true_positive + self.false_negative;
        (actual > 0).then(|| self.true_positive as f64 / actual as f64)
    }
}

/// Area under the ROC curve via the rank-sum statistic, ties averaged.
/// Undefined when only one class is present.
pub fn roc_auc(scores: &[f64], labels: &[bool]) -> Option<f64> {
    let positives = labels.iter().filter(|&&l| l).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 || scores.len() != labels.len() {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // 1-based ranks i+1 ..= j+1 share their mean
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = rank;
        }
        i = j + 1;
    }

    let positive_rank_sum: f64 = ranks
        .iter()
        .zip(labels)
        .filter(|(_, l)| **l)
        .map(|(r, _)| r)
        .sum();
    let p = positives as f64;
    let n = negatives as f64;
    Some((positive_rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMetrics {
    pub accuracy: f64,
    pub roc_auc: Option<f64>,
    pub confusion: ConfusionMatrix,
}

impl BinaryMetrics {
    pub fn compute(scores: &[f64], labels: &[bool]) -> Self {
        let confusion = ConfusionMatrix::from_scores(scores, labels);
        Self {
            accuracy: confusion.accuracy(),
            roc_auc: roc_auc(scores, labels),
            confusion,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub mse: f64,
}

impl RegressionMetrics {
    pub fn compute(predicted: &[f64], actual: &[f64]) -> Self {
        let n = predicted.len().min(actual.len());
        if n == 0 {
            return Self { mae: 0.0, mse: 0.0 };
        }
        let (abs_sum, sq_sum) = predicted
            .iter()
            .zip(actual)
            .fold((0.0, 0.0), |(a, s), (p, y)| {
                let err = p - y;
                (a + err.abs(), s + err * err)
            });
        Self {
            mae: abs_sum / n as f64,
            mse: sq_sum / n as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub samples: usize,
    pub profitable: BinaryMetrics,
    pub rug_risk: BinaryMetrics,
    pub max_profit: RegressionMetrics,
}

fn fmt_auc(auc: Option<f64>) -> String {
    auc.map(|a| format!("{:.4}", a))
        .unwrap_or_else(|| "n/a (single class)".to_string())
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Samples: {}", self.samples)?;
        writeln!(f, "  Profitable AUC: {}", fmt_auc(self.profitable.roc_auc))?;
        writeln!(f, "  Profitable Accuracy: {:.4}", self.profitable.accuracy)?;
        writeln!(f, "  Rug Risk AUC: {}", fmt_auc(self.rug_risk.roc_auc))?;
        writeln!(f, "  Rug Risk Accuracy: {:.4}", self.rug_risk.accuracy)?;
        writeln!(f, "  Max Profit MAE: {:.4}", self.max_profit.mae)?;
        writeln!(f, "  Max Profit MSE: {:.4}", self.max_profit.mse)?;
        let c = &self.profitable.confusion;
        write!(
            f,
            "  Profitable confusion: TP={} FP={} TN={} FN={}",
            c.true_positive, c.false_positive, c.true_negative, c.false_negative
        )
    }
}

/// Runs the model over every row of a processed split.
pub fn evaluate(
    predictor: &dyn ModelPredictor,
    split: &ProcessedSplit,
) -> FeatureResult<EvaluationReport> {
    let outputs = split
        .features
        .iter()
        .map(|f| {
            predictor
                .predict(f.candles.view(), &f.combined)
                .map_err(FeatureError::ModelInvocation)
        })
        .collect::<FeatureResult<Vec<ModelOutput>>>()?;
    debug!("Scored {} rows of {} split", outputs.len(), split.name);

    let profitable_scores: Vec<f64> = outputs.iter().map(|o| o.profitable).collect();
    let rug_scores: Vec<f64> = outputs.iter().map(|o| o.rug_risk).collect();
    let max_profit_pred: Vec<f64> = outputs.iter().map(|o| o.max_profit).collect();

    let profitable_true: Vec<bool> = split.labels.iter().map(|l| l.profitable).collect();
    let rug_true: Vec<bool> = split.labels.iter().map(|l| l.rug_risk).collect();
    let max_profit_true: Vec<f64> = split.labels.iter().map(|l| l.max_profit).collect();

    Ok(EvaluationReport {
        samples: outputs.len(),
        profitable: BinaryMetrics::compute(&profitable_scores, &profitable_true),
        rug_risk: BinaryMetrics::compute(&rug_scores, &rug_true),
        max_profit: RegressionMetrics::compute(&max_profit_pred, &max_profit_true),
    })
}
