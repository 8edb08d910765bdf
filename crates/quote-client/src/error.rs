//! Error types for quote resolution.

use thiserror::Error;


/// Quote error taxonomy shared by every provider and the fallback service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Empty or unparsable symbol. Never retried.
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Transport failure or a non-200 response.
    #[error("Network error: {0}")]
    Network(String),

    /// The vendor rejected the credentials (HTTP 401/403).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The vendor cannot serve this kind of request at all.
    #[error("Unsupported by provider: {0}")]
    Unsupported(String),

    /// The response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Well-formed response without a usable price or contracts.
    #[error("No data: {0}")]
    NoData(String),
}

impl Error {
    /// Short machine-readable code for the error kind.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidSymbol(_) => "INVALID_SYMBOL",
            Self::Network(_) => "NETWORK",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Unsupported(_) => "UNSUPPORTED",
            Self::Parse(_) => "PARSE",
            Self::NoData(_) => "NO_DATA",
        }
    }

    /// True when the failure means "this source can't help, ask the next one"
    /// rather than "the data does not exist".
    #[must_use]
    pub fn is_capability_gap(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::Unsupported(_))
    }
}

/// The request URL is dropped from the message: query-param vendors carry
/// their key in it.
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_decode() {
            Error::Parse(err.to_string())
        } else {
            Error::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Network(format!("invalid endpoint URL: {}", err))
    }
}
