//! Domain error types.

/// Top-level error type for zonetrader.
#[derive(Debug, thiserror::Error)]
pub enum ZonetraderError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("candles out of order at index {index}: {timestamp} does not follow {previous}")]
    UnorderedSeries {
        index: usize,
        previous: String,
        timestamp: String,
    },

    #[error("no data for {symbol} ({interval})")]
    NoData { symbol: String, interval: String },

    #[error("insufficient data for {symbol}: have {bars} candles, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&ZonetraderError> for std::process::ExitCode {
    fn from(err: &ZonetraderError) -> Self {
        let code: u8 = match err {
            ZonetraderError::Io(_) | ZonetraderError::Report { .. } => 1,
            ZonetraderError::ConfigParse { .. }
            | ZonetraderError::ConfigMissing { .. }
            | ZonetraderError::ConfigInvalid { .. } => 2,
            ZonetraderError::Data { .. } | ZonetraderError::UnorderedSeries { .. } => 3,
            ZonetraderError::NoData { .. } | ZonetraderError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_missing_message() {
        let err = ZonetraderError::ConfigMissing {
            section: "backtest".into(),
            key: "risk_pct".into(),
        };
        assert_eq!(err.to_string(), "missing config key [backtest] risk_pct");
    }

    #[test]
    fn insufficient_data_message() {
        let err = ZonetraderError::InsufficientData {
            symbol: "BHP".into(),
            bars: 3,
            minimum: 11,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data for BHP: have 3 candles, need 11"
        );
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ZonetraderError = io.into();
        assert!(matches!(err, ZonetraderError::Io(_)));
    }
}
