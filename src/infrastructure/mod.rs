pub mod mock;
pub mod onnx_predictor;
pub mod persistence;

pub use onnx_predictor::OnnxPredictor;
