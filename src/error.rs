use std::path::PathBuf;

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the application
///
/// Malformed Java input is not an error: the analyzer degrades and reports diagnostics.
/// Only contract violations (bad format/mode values) and collaborator failures end up here.
#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),
    /// Raised only when the caller asks for strict analysis and the result is degraded
    UnparseableInput { file: PathBuf, diagnostics: usize },
    UnsupportedFormat(String),
    UnsupportedMode(String),
    SerializationError(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "IO error: {}", e),
            Error::UnparseableInput { file, diagnostics } => write!(
                f,
                "unparseable input {}: analysis degraded with {} diagnostic(s)",
                file.display(),
                diagnostics
            ),
            Error::UnsupportedFormat(value) => write!(
                f,
                "unsupported documentation format '{}' (expected markdown, html or json)",
                value
            ),
            Error::UnsupportedMode(value) => write!(
                f,
                "unsupported analysis mode '{}' (expected structure, quality or dependencies)",
                value
            ),
            Error::SerializationError(msg) => write!(f, "serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_names_value() {
        let err = Error::UnsupportedFormat("pdf".to_string());
        assert!(err.to_string().contains("'pdf'"));
    }

    #[test]
    fn test_unparseable_input_display() {
        let err = Error::UnparseableInput {
            file: PathBuf::from("src/A.java"),
            diagnostics: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("src/A.java"));
        assert!(msg.contains("2 diagnostic"));
    }

    #[test]
    fn test_io_error_has_source() {
        use std::error::Error as _;
        let err = Error::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(err.source().is_some());
    }
}
