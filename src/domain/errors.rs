use thiserror::Error;

/// Errors raised while turning raw market data into model-ready features,
/// fitting or applying scalers, and invoking the model.
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Shape error: {0}")]
    Shape(String),

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Dimension mismatch: scaler fitted on {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Insufficient data: need at least {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Model invocation failed: {0}")]
    ModelInvocation(String),

    #[error("Model load failed: {0}")]
    ModelLoad(String),
}

impl FeatureError {
    pub fn missing(field: impl Into<String>) -> Self {
        FeatureError::MissingField {
            field: field.into(),
        }
    }
}

impl From<serde_json::Error> for FeatureError {
    fn from(err: serde_json::Error) -> Self {
        FeatureError::Parse(err.to_string())
    }
}

pub type FeatureResult<T> = Result<T, FeatureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_formatting() {
        let err = FeatureError::DimensionMismatch {
            expected: 5,
            actual: 4,
        };

        let msg = err.to_string();
        assert!(msg.contains("5 features"));
        assert!(msg.contains("got 4"));
    }

    #[test]
    fn test_missing_field_formatting() {
        let err = FeatureError::missing("examples[3].context.holders");
        assert_eq!(
            err.to_string(),
            "Missing required field: examples[3].context.holders"
        );
    }
}
