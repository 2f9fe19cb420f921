use serde::{Deserialize, Serialize};

/// One OHLCV observation. Sequences of candles are always chronological.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Builds a candle from a `[open, high, low, close, volume]` row.
    pub fn from_row(row: [f64; 5]) -> Self {
        Self::new(row[0], row[1], row[2], row[3], row[4])
    }

    pub fn to_row(&self) -> [f64; 5] {
        [self.open, self.high, self.low, self.close, self.volume]
    }

    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn upper_wick(&self) -> f64 {
        self.high - self.close.max(self.open)
    }

    pub fn lower_wick(&self) -> f64 {
        self.close.min(self.open) - self.low
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Token-level context supplied alongside the candle window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenContext {
    pub liquidity: f64,
    pub market_cap: f64,
    pub holders: f64,
    #[serde(alias = "age", alias = "age_hours")]
    pub age_hours: f64,
    #[serde(rename = "volume24h")]
    pub volume_24h: f64,
}

impl TokenContext {
    pub fn from_array(values: [f64; 5]) -> Self {
        Self {
            liquidity: values[0],
            market_cap: values[1],
            holders: values[2],
            age_hours: values[3],
            volume_24h: values[4],
        }
    }

    pub fn to_array(&self) -> [f64; 5] {
        [
            self.liquidity,
            self.market_cap,
            self.holders,
            self.age_hours,
            self.volume_24h,
        ]
    }
}

/// Technical indicators computed upstream over the candle window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub rsi: f64,
    pub macd: f64,
    #[serde(alias = "emaFast")]
    pub ema_fast: f64,
    #[serde(alias = "emaSlow")]
    pub ema_slow: f64,
    #[serde(alias = "bbandsWidth")]
    pub bbands_width: f64,
}

impl IndicatorSet {
    pub fn from_array(values: [f64; 5]) -> Self {
        Self {
            rsi: values[0],
            macd: values[1],
            ema_fast: values[2],
            ema_slow: values[3],
            bbands_width: values[4],
        }
    }

    pub fn to_array(&self) -> [f64; 5] {
        [
            self.rsi,
            self.macd,
            self.ema_fast,
            self.ema_slow,
            self.bbands_width,
        ]
    }
}
