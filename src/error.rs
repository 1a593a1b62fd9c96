use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from persistence, logging or the terminal.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Invalid path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// A persisted snapshot could not be encoded or decoded.
    #[error("Persistence error: {0}")]
    Persistence(#[from] serde_json::Error),

    /// The environment rejected a clipboard write.
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// The log subscriber could not be installed.
    #[error("Logging error: {0}")]
    Logging(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
        assert!(app_err.to_string().contains("file not found"));
    }

    #[test]
    fn json_error_conversion() {
        let json_err = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
        let app_err: AppError = json_err.into();
        assert!(matches!(app_err, AppError::Persistence(_)));
        assert!(app_err.to_string().starts_with("Persistence error:"));
    }

    #[test]
    fn clipboard_error_display() {
        let err = AppError::Clipboard("terminal refused OSC 52".into());
        assert_eq!(err.to_string(), "Clipboard error: terminal refused OSC 52");
    }

    #[test]
    fn invalid_path_error_display() {
        let err = AppError::InvalidPath("/nonexistent".into());
        assert_eq!(err.to_string(), "Invalid path: /nonexistent");
    }
}
