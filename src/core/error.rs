//! Error types for the wheel screener

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScreenerError {
    #[error("Provider unavailable for {ticker}: {reason}")]
    ProviderUnavailable { ticker: String, reason: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Computation error: {0}")]
    Computation(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type ScreenerResult<T> = Result<T, ScreenerError>;

impl ScreenerError {
    pub fn unavailable(ticker: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            ticker: ticker.into(),
            reason: reason.into(),
        }
    }

    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    pub fn computation(msg: impl Into<String>) -> Self {
        Self::Computation(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this failure should only skip the current ticker
    pub fn is_ticker_scoped(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable { .. }
                | Self::Network(_)
                | Self::Data(_)
                | Self::MissingField(_)
                | Self::Timeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScreenerError::unavailable("KO", "no price");
        assert_eq!(err.to_string(), "Provider unavailable for KO: no price");
        assert!(err.is_ticker_scoped());
        assert!(!ScreenerError::config("bad").is_ticker_scoped());
    }
}
