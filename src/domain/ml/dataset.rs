//! Persisted training dataset records.
//!
//! Records mirror the on-disk JSON and keep every field optional so that
//! validation can report exactly which field is absent. Typed values
//! (`Candle`, `TokenContext`, ...) are only produced through the accessors
//! below, which is where shape and missing-field errors originate.

use crate::domain::errors::{FeatureError, FeatureResult};
use crate::domain::market::{Candle, IndicatorSet, TokenContext};
use crate::domain::ml::patterns::PatternFeatures;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl From<Candle> for CandleRecord {
    fn from(c: Candle) -> Self {
        Self {
            open: Some(c.open),
            high: Some(c.high),
            low: Some(c.low),
            close: Some(c.close),
            volume: Some(c.volume),
        }
    }
}

impl CandleRecord {
    /// A candle record missing any OHLCV field is a shape error, not a
    /// missing-field error: the per-timestep row would have fewer than 5 columns.
    pub fn to_candle(&self, index: usize) -> FeatureResult<Candle> {
        let field = |value: Option<f64>, name: &str| {
            value.ok_or_else(|| {
                FeatureError::Shape(format!("candle {} is missing field `{}`", index, name))
            })
        };

        Ok(Candle {
            open: field(self.open, "open")?,
            high: field(self.high, "high")?,
            low: field(self.low, "low")?,
            close: field(self.close, "close")?,
            volume: field(self.volume, "volume")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holders: Option<f64>,
    #[serde(
        default,
        alias = "age",
        alias = "age_hours",
        skip_serializing_if = "Option::is_none"
    )]
    pub age_hours: Option<f64>,
    #[serde(
        default,
        rename = "volume24h",
        skip_serializing_if = "Option::is_none"
    )]
    pub volume_24h: Option<f64>,
}

impl From<TokenContext> for ContextRecord {
    fn from(c: TokenContext) -> Self {
        Self {
            liquidity: Some(c.liquidity),
            market_cap: Some(c.market_cap),
            holders: Some(c.holders),
            age_hours: Some(c.age_hours),
            volume_24h: Some(c.volume_24h),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macd: Option<f64>,
    #[serde(default, alias = "emaFast", skip_serializing_if = "Option::is_none")]
    pub ema_fast: Option<f64>,
    #[serde(default, alias = "emaSlow", skip_serializing_if = "Option::is_none")]
    pub ema_slow: Option<f64>,
    #[serde(
        default,
        alias = "bbandsWidth",
        skip_serializing_if = "Option::is_none"
    )]
    pub bbands_width: Option<f64>,
}

impl From<IndicatorSet> for IndicatorRecord {
    fn from(i: IndicatorSet) -> Self {
        Self {
            rsi: Some(i.rsi),
            macd: Some(i.macd),
            ema_fast: Some(i.ema_fast),
            ema_slow: Some(i.ema_slow),
            bbands_width: Some(i.bbands_width),
        }
    }
}

/// Supervised targets attached to each example.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Labels {
    pub profitable: bool,
    #[serde(alias = "maxProfit")]
    pub max_profit: f64,
    #[serde(alias = "rugRisk")]
    pub rug_risk: bool,
}

impl Labels {
    pub fn to_array(&self) -> [f64; 3] {
        [
            if self.profitable { 1.0 } else { 0.0 },
            self.max_profit,
            if self.rug_risk { 1.0 } else { 0.0 },
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    #[serde(default)]
    pub candles: Vec<CandleRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicators: Option<IndicatorRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<PatternFeatures>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
    /// Fields this crate does not interpret (token address, timestamps, ...).
    /// Preserved verbatim when a dataset is re-written.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TrainingExample {
    /// Validated chronological candle window. Empty windows are a shape error.
    pub fn candles(&self) -> FeatureResult<Vec<Candle>> {
        if self.candles.is_empty() {
            return Err(FeatureError::Shape(
                "candle window length is zero".to_string(),
            ));
        }
        self.candles
            .iter()
            .enumerate()
            .map(|(i, c)| c.to_candle(i))
            .collect()
    }

    /// `path` prefixes field names in error messages, e.g. `examples[3]`.
    pub fn context(&self, path: &str) -> FeatureResult<TokenContext> {
        let ctx = self
            .context
            .as_ref()
            .ok_or_else(|| FeatureError::missing(format!("{}.context", path)))?;
        let field = |value: Option<f64>, name: &str| {
            value.ok_or_else(|| FeatureError::missing(format!("{}.context.{}", path, name)))
        };

        Ok(TokenContext {
            liquidity: field(ctx.liquidity, "liquidity")?,
            market_cap: field(ctx.market_cap, "marketCap")?,
            holders: field(ctx.holders, "holders")?,
            age_hours: field(ctx.age_hours, "ageHours")?,
            volume_24h: field(ctx.volume_24h, "volume24h")?,
        })
    }

    pub fn indicators(&self, path: &str) -> FeatureResult<IndicatorSet> {
        let ind = self
            .indicators
            .as_ref()
            .ok_or_else(|| FeatureError::missing(format!("{}.indicators", path)))?;
        let field = |value: Option<f64>, name: &str| {
            value.ok_or_else(|| FeatureError::missing(format!("{}.indicators.{}", path, name)))
        };

        Ok(IndicatorSet {
            rsi: field(ind.rsi, "rsi")?,
            macd: field(ind.macd, "macd")?,
            ema_fast: field(ind.ema_fast, "ema_fast")?,
            ema_slow: field(ind.ema_slow, "ema_slow")?,
            bbands_width: field(ind.bbands_width, "bbands_width")?,
        })
    }

    pub fn labels(&self, path: &str) -> FeatureResult<Labels> {
        self.labels
            .ok_or_else(|| FeatureError::missing(format!("{}.labels", path)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_examples: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetDocument {
    pub examples: Vec<TrainingExample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DatasetMetadata>,
}

impl DatasetDocument {
    /// Accepts a wrapped `{ "examples": [...], "metadata": {...} }` document
    /// or a bare example array. Errors name the offending example and
    /// section, e.g. `examples[2].labels`.
    pub fn from_value(value: Value) -> FeatureResult<Self> {
        let (examples, metadata) = match value {
            Value::Array(items) => (items, None),
            Value::Object(mut map) => {
                let examples = match map.remove("examples") {
                    Some(Value::Array(items)) => items,
                    Some(_) => {
                        return Err(FeatureError::Parse(
                            "`examples` must be an array".to_string(),
                        ));
                    }
                    None => return Err(FeatureError::missing("examples")),
                };
                let metadata = match map.remove("metadata") {
                    None | Some(Value::Null) => None,
                    Some(meta) => Some(
                        serde_json::from_value(meta)
                            .map_err(|e| FeatureError::Parse(format!("metadata: {}", e)))?,
                    ),
                };
                (examples, metadata)
            }
            _ => {
                return Err(FeatureError::Parse(
                    "dataset must be an object or an array of examples".to_string(),
                ));
            }
        };

        let examples = examples
            .iter()
            .enumerate()
            .map(|(i, value)| TrainingExample::from_value(value, i))
            .collect::<FeatureResult<Vec<_>>>()?;
        Ok(Self { examples, metadata })
    }
}

impl TrainingExample {
    /// `index` locates the example in its dataset for error messages.
    pub fn from_value(value: &Value, index: usize) -> FeatureResult<Self> {
        match TrainingExample::deserialize(value) {
            Ok(example) => Ok(example),
            Err(e) => Err(locate_error(value, index).unwrap_or_else(|| {
                FeatureError::Parse(format!("examples[{}]: {}", index, e))
            })),
        }
    }
}

fn section_error<T: for<'de> Deserialize<'de>>(
    value: &Value,
    path: &str,
) -> Option<FeatureError> {
    T::deserialize(value)
        .err()
        .map(|e| FeatureError::Parse(format!("{}: {}", path, e)))
}

/// Re-checks each known section of a failed example on its own so the error
/// carries a field path.
fn locate_error(value: &Value, index: usize) -> Option<FeatureError> {
    let path = format!("examples[{}]", index);
    let Some(fields) = value.as_object() else {
        return Some(FeatureError::Parse(format!(
            "{}: expected an object",
            path
        )));
    };

    fields.iter().find_map(|(key, field)| {
        let path = format!("{}.{}", path, key);
        match key.as_str() {
            "candles" => match field.as_array() {
                Some(candles) => candles.iter().enumerate().find_map(|(t, candle)| {
                    section_error::<CandleRecord>(candle, &format!("{}[{}]", path, t))
                }),
                None => section_error::<Vec<CandleRecord>>(field, &path),
            },
            "context" => section_error::<Option<ContextRecord>>(field, &path),
            "indicators" => section_error::<Option<IndicatorRecord>>(field, &path),
            "patterns" => section_error::<Option<PatternFeatures>>(field, &path),
            "labels" => section_error::<Option<Labels>>(field, &path),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_json() -> &'static str {
        r#"{
            "candles": [
                {"open": 1.0, "high": 1.2, "low": 0.9, "close": 1.1, "volume": 10.0},
                {"open": 1.1, "high": 1.3, "low": 1.0, "close": 1.2, "volume": 12.0}
            ],
            "context": {"liquidity": 1.0, "marketCap": 2.0, "holders": 3.0, "age": 4.0, "volume24h": 5.0},
            "indicators": {"rsi": 50.0, "macd": 0.1, "ema_fast": 1.0, "ema_slow": 1.1, "bbands_width": 0.2},
            "labels": {"profitable": true, "max_profit": 3.5, "rug_risk": false},
            "token": "So11111111111111111111111111111111111111112"
        }"#
    }

    #[test]
    fn test_parse_example_and_preserve_unknown_fields() {
        let example: TrainingExample = serde_json::from_str(example_json()).unwrap();
        assert_eq!(example.candles.len(), 2);
        assert!(example.patterns.is_none());
        assert!(example.extra.contains_key("token"));

        let candles = example.candles().unwrap();
        assert_eq!(candles[1].close, 1.2);

        let ctx = example.context("examples[0]").unwrap();
        assert_eq!(ctx.age_hours, 4.0);

        let round_trip = serde_json::to_value(&example).unwrap();
        assert!(round_trip.get("token").is_some());
    }

    #[test]
    fn test_candle_missing_field_is_shape_error() {
        let record = CandleRecord {
            open: Some(1.0),
            high: Some(1.0),
            low: Some(1.0),
            close: None,
            volume: Some(1.0),
        };
        match record.to_candle(7) {
            Err(FeatureError::Shape(msg)) => {
                assert!(msg.contains("candle 7"));
                assert!(msg.contains("close"));
            }
            other => panic!("Expected Shape error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_window_is_shape_error() {
        let example = TrainingExample::default();
        assert!(matches!(example.candles(), Err(FeatureError::Shape(_))));
    }

    #[test]
    fn test_missing_context_field_reports_path() {
        let mut example: TrainingExample = serde_json::from_str(example_json()).unwrap();
        if let Some(ctx) = example.context.as_mut() {
            ctx.holders = None;
        }

        match example.context("examples[3]") {
            Err(FeatureError::MissingField { field }) => {
                assert_eq!(field, "examples[3].context.holders");
            }
            other => panic!("Expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_document_accepts_bare_array_and_wrapped() {
        let bare: Value = serde_json::from_str(&format!("[{}]", example_json())).unwrap();
        let doc = DatasetDocument::from_value(bare).unwrap();
        assert_eq!(doc.examples.len(), 1);
        assert!(doc.metadata.is_none());

        let wrapped: Value = serde_json::from_str(&format!(
            r#"{{"examples": [{}], "metadata": {{"total_examples": 1, "source": "merged"}}}}"#,
            example_json()
        ))
        .unwrap();
        let doc = DatasetDocument::from_value(wrapped).unwrap();
        assert_eq!(doc.examples.len(), 1);
        let meta = doc.metadata.unwrap();
        assert_eq!(meta.total_examples, Some(1));
        assert_eq!(meta.source.as_deref(), Some("merged"));
    }

    #[test]
    fn test_bad_label_reports_example_and_section() {
        let bad = example_json().replace(r#""profitable": true"#, r#""profitable": "yes""#);
        let value: Value = serde_json::from_str(&format!(
            r#"{{"examples": [{}, {}, {}]}}"#,
            example_json(),
            example_json(),
            bad
        ))
        .unwrap();

        match DatasetDocument::from_value(value) {
            Err(FeatureError::Parse(msg)) => {
                assert!(msg.starts_with("examples[2].labels:"), "got {}", msg);
                assert!(msg.contains("boolean"), "got {}", msg);
            }
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_candle_reports_index() {
        let bad = example_json().replace(r#""close": 1.2"#, r#""close": "n/a""#);
        let value: Value = serde_json::from_str(&format!("[{}]", bad)).unwrap();

        match DatasetDocument::from_value(value) {
            Err(FeatureError::Parse(msg)) => {
                assert!(msg.starts_with("examples[0].candles[1]:"), "got {}", msg);
            }
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_document_without_examples_is_rejected() {
        let value: Value = serde_json::from_str(r#"{"metadata": {}}"#).unwrap();
        assert!(matches!(
            DatasetDocument::from_value(value),
            Err(FeatureError::MissingField { .. })
        ));
        assert!(DatasetDocument::from_value(Value::from(3)).is_err());
    }
}
