use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Page fetch failed: {0}")]
    FetchFailed(String),

    #[error("Browser launch failed: {0}")]
    BrowserLaunchFailed(String),

    #[error("Browser close failed: {0}")]
    BrowserCloseFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Page script failed: {0}")]
    ScriptFailed(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Coarse classification used at the service boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed request field
    InvalidInput,
    /// The initial page retrieval failed
    Fetch,
    /// Browser launch, navigation, wait or in-page script failed
    Render,
    /// Local failures unrelated to the page (config, IO, serialization)
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Fetch => "fetch",
            ErrorKind::Render => "render",
            ErrorKind::Internal => "internal",
        }
    }
}

impl ExtractionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractionError::InvalidInput(_) => ErrorKind::InvalidInput,
            ExtractionError::FetchFailed(_) => ErrorKind::Fetch,
            ExtractionError::BrowserLaunchFailed(_)
            | ExtractionError::BrowserCloseFailed(_)
            | ExtractionError::NavigationFailed(_)
            | ExtractionError::Timeout(_)
            | ExtractionError::ScriptFailed(_) => ErrorKind::Render,
            ExtractionError::ConfigurationError(_)
            | ExtractionError::IoError(_)
            | ExtractionError::SerializationError(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status reported to callers for this error.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidInput => 400,
            _ => 500,
        }
    }
}

impl From<std::io::Error> for ExtractionError {
    fn from(err: std::io::Error) -> Self {
        ExtractionError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ExtractionError {
    fn from(err: serde_json::Error) -> Self {
        ExtractionError::SerializationError(err.to_string())
    }
}

impl From<url::ParseError> for ExtractionError {
    fn from(err: url::ParseError) -> Self {
        ExtractionError::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(ExtractionError::InvalidInput("x".into()).kind(), ErrorKind::InvalidInput);
        assert_eq!(ExtractionError::FetchFailed("x".into()).kind(), ErrorKind::Fetch);
        assert_eq!(ExtractionError::BrowserLaunchFailed("x".into()).kind(), ErrorKind::Render);
        assert_eq!(ExtractionError::NavigationFailed("x".into()).kind(), ErrorKind::Render);
        assert_eq!(ExtractionError::Timeout(Duration::from_secs(1)).kind(), ErrorKind::Render);
        assert_eq!(ExtractionError::ScriptFailed("x".into()).kind(), ErrorKind::Render);
        assert_eq!(ExtractionError::IoError("x".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ExtractionError::InvalidInput("missing".into()).status_code(), 400);
        assert_eq!(ExtractionError::FetchFailed("404".into()).status_code(), 500);
        assert_eq!(ExtractionError::Timeout(Duration::from_secs(30)).status_code(), 500);
        assert_eq!(ExtractionError::ConfigurationError("bad".into()).status_code(), 500);
    }

    #[test]
    fn test_parse_error_is_invalid_input() {
        let err: ExtractionError = url::Url::parse("not a url").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
