//! Centralized error handling for the upcoming-shows subscriber
//!
//! Every fallible component returns one of the typed errors below so that
//! nothing crosses a component boundary as an untyped failure.
//!
//! # Error Categories
//!
//! - **Source Errors**: feed transport, status and parse failures (run-fatal)
//! - **Repository Errors**: history and ledger persistence (terminal for a run)
//! - **Configuration Errors**: bad config values at startup
//! - **External Service Errors**: TMDB, webhook and other collaborators
//!
//! Per-item outcomes (unrecognised shows, filter rejections, refused
//! subscriptions) are not errors; they are reported as
//! [`crate::ingestor::SkipReason`] values and logged.
//!
//! # Usage
//!
//! ```rust
//! use tv_coming::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Ok("success".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Repository Results
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Convenience type alias for Source Results
pub type SourceResult<T> = Result<T, SourceError>;
