// Market data inputs
mod candle;

pub use candle::{Candle, IndicatorSet, TokenContext};
