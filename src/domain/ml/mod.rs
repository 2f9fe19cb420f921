pub mod dataset;
pub mod feature_registry;
pub mod patterns;
pub mod scaler_params;
