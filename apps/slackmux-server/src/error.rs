//! Error types for the slackmux-server application.

use thiserror::Error;

/// Error type for slackmux-server operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServerError {
    /// A configuration error (missing or invalid config file/values).
    #[error("Config error: {0}")]
    Config(String),

    /// The interaction mux rejected a handler registration.
    #[error(transparent)]
    Registration(#[from] slackmux::RegistrationError),

    /// The relay HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// An I/O error from binding or serving.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_display_config_error() {
        let err = ServerError::Config("path must start with '/'".into());
        assert_eq!(err.to_string(), "Config error: path must start with '/'");
    }

    #[test]
    fn test_should_convert_from_registration_error() {
        let err: ServerError = slackmux::RegistrationError::EmptyActionId.into();
        assert!(matches!(err, ServerError::Registration(_)));
        assert!(err.to_string().contains("empty action id"));
    }

    #[test]
    fn test_should_convert_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use");
        let err: ServerError = io_err.into();
        assert!(matches!(err, ServerError::Io(_)));
        assert!(err.to_string().contains("in use"));
    }
}
