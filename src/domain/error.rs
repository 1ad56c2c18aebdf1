//! Domain error types.

/// Top-level error type for the strategy tester.
#[derive(Debug, thiserror::Error)]
pub enum TesterError {
    #[error("no price bars for {ticker}")]
    EmptyData { ticker: String },

    #[error("invalid price data for {ticker}: {reason}")]
    InvalidData { ticker: String, reason: String },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("unknown strategy '{0}' (expected one of: bb, macd, sma, bnh)")]
    UnknownStrategy(String),

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

    #[error("malformed parameter table row {row}: {reason}")]
    ParamTable { row: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TesterError {
    /// Data errors skip a single ticker; everything else aborts the run.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            TesterError::EmptyData { .. }
                | TesterError::InvalidData { .. }
                | TesterError::DataSource { .. }
        )
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            TesterError::UnknownStrategy(_)
                | TesterError::ConfigParse { .. }
                | TesterError::ConfigMissing { .. }
                | TesterError::ConfigInvalid { .. }
                | TesterError::ParamTable { .. }
        )
    }
}

impl From<&TesterError> for std::process::ExitCode {
    fn from(err: &TesterError) -> Self {
        let code: u8 = match err {
            TesterError::Io(_) => 1,
            TesterError::UnknownStrategy(_)
            | TesterError::ConfigParse { .. }
            | TesterError::ConfigMissing { .. }
            | TesterError::ConfigInvalid { .. }
            | TesterError::ParamTable { .. } => 2,
            TesterError::EmptyData { .. }
            | TesterError::InvalidData { .. }
            | TesterError::DataSource { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_data_is_data_error() {
        let err = TesterError::EmptyData {
            ticker: "600000".into(),
        };
        assert!(err.is_data_error());
        assert!(!err.is_config_error());
        assert_eq!(err.to_string(), "no price bars for 600000");
    }

    #[test]
    fn unknown_strategy_is_config_error() {
        let err = TesterError::UnknownStrategy("foo".into());
        assert!(err.is_config_error());
        assert!(!err.is_data_error());
        assert!(err.to_string().contains("'foo'"));
    }

    #[test]
    fn param_table_message_names_row() {
        let err = TesterError::ParamTable {
            row: 3,
            reason: "bad number".into(),
        };
        assert_eq!(
            err.to_string(),
            "malformed parameter table row 3: bad number"
        );
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: TesterError = io.into();
        assert!(matches!(err, TesterError::Io(_)));
        assert!(!err.is_data_error());
    }
}
