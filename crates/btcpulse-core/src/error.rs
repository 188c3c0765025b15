use thiserror::Error;

/// Validation and contract errors exposed by `btcpulse-core`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error(
        "invalid metric '{value}', expected one of price, dominance, fear_greed, nupl, sopr, mvrv"
    )]
    UnknownMetric { value: String },
    #[error(
        "invalid source '{value}', expected one of coingecko, coincap, coinpaprika, alternative_me, bitcoin_data"
    )]
    InvalidSource { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("unix timestamp {value} is out of range")]
    TimestampOutOfRange { value: i64 },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("field '{field}' must be positive")]
    NonPositiveValue { field: &'static str },

    #[error("{metric} value {value} is outside plausible range {min}..{max}")]
    Implausible {
        metric: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("days must be within {min}..={max}, got {value}")]
    InvalidDays { value: i64, min: u32, max: u32 },

    #[error("invalid configuration for '{key}': {reason}")]
    InvalidConfig { key: String, reason: String },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
