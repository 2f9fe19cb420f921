// Market data inputs
pub mod market;

// Feature layout, datasets and scaler parameters
pub mod ml;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
