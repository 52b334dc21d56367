//! Error types for the stop engine and its collaborators.

/// Failure reported by a price-history provider.
///
/// The engine treats these as opaque: they are wrapped in
/// [`StopError::Upstream`] and never retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataError {
    #[error("network error: {0}")]
    Network(String),

    #[error("ticker not found: {ticker}")]
    NotFound { ticker: String },

    #[error("malformed data: {0}")]
    Malformed(String),

    #[error("read error: {0}")]
    Io(String),
}

/// Top-level error type for volstop.
#[derive(Debug, thiserror::Error)]
pub enum StopError {
    #[error("insufficient data for ATR({period}): need {required} bars, have {actual}")]
    InsufficientData {
        period: usize,
        required: usize,
        actual: usize,
    },

    #[error("insufficient ATR history for regime classification: {points} point(s), need at least 2")]
    InsufficientHistory { points: usize },

    #[error("invalid configuration for {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("invalid risk per share {risk_per_share:.4}: position is at or through its stop")]
    InvalidRisk { risk_per_share: f64 },

    #[error("invalid price series: {reason}")]
    InvalidSeries { reason: String },

    #[error("upstream data error for {ticker}: {source}")]
    Upstream {
        ticker: String,
        #[source]
        source: DataError,
    },

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

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StopError {
    pub(crate) fn invalid_config(field: &str, reason: impl Into<String>) -> Self {
        StopError::InvalidConfig {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&StopError> for std::process::ExitCode {
    fn from(err: &StopError) -> Self {
        let code: u8 = match err {
            StopError::Io(_) => 1,
            StopError::InvalidConfig { .. }
            | StopError::ConfigParse { .. }
            | StopError::ConfigMissing { .. }
            | StopError::ConfigInvalid { .. } => 2,
            StopError::InsufficientData { .. }
            | StopError::InsufficientHistory { .. }
            | StopError::InvalidSeries { .. } => 5,
            StopError::InvalidRisk { .. } => 6,
            StopError::Upstream { .. } => 7,
        };
        std::process::ExitCode::from(code)
    }
}
