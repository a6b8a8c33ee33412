//! Domain error types.

/// Top-level error type for titan.
#[derive(Debug, thiserror::Error)]
pub enum TitanError {
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

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {ticker}")]
    NoData { ticker: String },

    #[error("insufficient data: have {rows} rows, need more than {minimum}")]
    InsufficientData { rows: usize, minimum: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TitanError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        TitanError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&TitanError> for std::process::ExitCode {
    fn from(err: &TitanError) -> Self {
        let code: u8 = match err {
            TitanError::Io(_) => 1,
            TitanError::ConfigParse { .. }
            | TitanError::ConfigMissing { .. }
            | TitanError::ConfigInvalid { .. } => 2,
            TitanError::Data { .. } => 3,
            TitanError::NoData { .. } | TitanError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
