//! Error type definitions for the upcoming-shows subscriber
//!
//! The hierarchy mirrors the run semantics: a [`SourceError`] aborts a run
//! before anything is touched, a [`RepositoryError`] is the terminal error of
//! a run, everything else is a startup or collaborator problem.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Feed fetching errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Persistence errors
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// External service errors
    #[error("External service error: {service} - {message}")]
    ExternalService { service: String, message: String },

    /// Operation already in progress errors
    #[error("Operation already in progress: {operation_type} on {resource}")]
    OperationInProgress {
        operation_type: String,
        resource: String,
    },

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Persistence specific errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Reading or writing the backing file failed
    #[error("I/O failed on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Data serialization/deserialization failures
    #[error("Serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// Replacing the persisted file failed after the data was written
    #[error("Persist failed: {path} - {message}")]
    PersistFailed { path: PathBuf, message: String },
}

/// Feed fetching errors
#[derive(Error, Debug)]
pub enum SourceError {
    /// Network connection timeouts
    #[error("Connection timeout: {url}")]
    Timeout { url: String },

    /// Transport level failures (DNS, TLS, refused connections)
    #[error("Transport error: {url} - {message}")]
    Transport { url: String, message: String },

    /// Non-success HTTP status from the feed
    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    /// The feed answered with an empty body
    #[error("Empty response: {url}")]
    EmptyResponse { url: String },

    /// Parsing errors for source data
    #[error("Parse error: {source_type} - {message}")]
    ParseError {
        source_type: String,
        message: String,
    },

    /// Invalid source configuration
    #[error("Invalid configuration: {field} - {message}")]
    InvalidConfig { field: String, message: String },
}

impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an external service error
    pub fn external_service<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create an operation in progress error
    pub fn operation_in_progress<O: Into<String>, R: Into<String>>(
        operation_type: O,
        resource: R,
    ) -> Self {
        Self::OperationInProgress {
            operation_type: operation_type.into(),
            resource: resource.into(),
        }
    }
}

impl RepositoryError {
    /// Wrap an I/O error with the path it happened on
    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a persist failed error
    pub fn persist_failed<P: Into<PathBuf>, M: Into<String>>(path: P, message: M) -> Self {
        Self::PersistFailed {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl SourceError {
    /// Create a timeout error
    pub fn timeout<U: Into<String>>(url: U) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Create a transport error
    pub fn transport<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an empty response error
    pub fn empty_response<U: Into<String>>(url: U) -> Self {
        Self::EmptyResponse { url: url.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse_error<S: Into<String>, M: Into<String>>(source_type: S, message: M) -> Self {
        Self::ParseError {
            source_type: source_type.into(),
            message: message.into(),
        }
    }

    /// Map a reqwest failure onto the feed error taxonomy
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(url)
        } else if let Some(status) = err.status() {
            Self::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            Self::transport(url, err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_converts_into_app_error() {
        let err: AppError = SourceError::empty_response("http://feed").into();
        assert!(matches!(err, AppError::Source(SourceError::EmptyResponse { .. })));
        assert_eq!(err.to_string(), "Source error: Empty response: http://feed");
    }

    #[test]
    fn test_repository_error_display_includes_path() {
        let err = RepositoryError::persist_failed("/tmp/history.json", "rename failed");
        assert!(err.to_string().contains("/tmp/history.json"));
    }
}
