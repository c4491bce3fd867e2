use thiserror::Error;

/// Top-level error type for the Doki system.
///
/// Backend variants carry the detail that gets logged; callers at the HTTP
/// boundary only ever see an opaque internal error for them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DokiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Image labeling error: {0}")]
    ImageLabeling(String),

    #[error("Web search error: {0}")]
    WebSearch(String),

    #[error("Text generation error: {0}")]
    Generation(String),

    #[error("Backend not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for DokiError {
    fn from(err: toml::de::Error) -> Self {
        DokiError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DokiError {
    fn from(err: toml::ser::Error) -> Self {
        DokiError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for DokiError {
    fn from(err: serde_json::Error) -> Self {
        DokiError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Doki operations.
pub type Result<T> = std::result::Result<T, DokiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let cases: Vec<(DokiError, &str)> = vec![
            (
                DokiError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                DokiError::Storage("disk full".to_string()),
                "Storage error: disk full",
            ),
            (
                DokiError::ImageLabeling("quota exceeded".to_string()),
                "Image labeling error: quota exceeded",
            ),
            (
                DokiError::WebSearch("HTTP 403".to_string()),
                "Web search error: HTTP 403",
            ),
            (
                DokiError::Generation("model overloaded".to_string()),
                "Text generation error: model overloaded",
            ),
            (
                DokiError::NotConfigured("OPENAI_API_KEY".to_string()),
                "Backend not configured: OPENAI_API_KEY",
            ),
            (
                DokiError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let doki_err: DokiError = io_err.into();
        assert!(matches!(doki_err, DokiError::Io(_)));
        assert!(doki_err.to_string().starts_with("I/O error:"));
        assert!(doki_err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let doki_err: DokiError = err.unwrap_err().into();
        assert!(matches!(doki_err, DokiError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let doki_err: DokiError = err.unwrap_err().into();
        assert!(matches!(doki_err, DokiError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
