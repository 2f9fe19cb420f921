pub mod context_scorer;
pub mod dataset_split;
pub mod evaluation;
pub mod feature_assembler;
pub mod inference_service;
pub mod pattern_detector;
pub mod pattern_enrichment;
pub mod preprocessor;
pub mod scaler_pipeline;
