//! Error types for the MikroTik exporter.
//!
//! This module defines the crate-wide error type using `thiserror`, the
//! value parsing error produced by converters, and [`MultiError`], the
//! accumulator used wherever independent sub-operations must all be
//! attempted even when some of them fail.

use std::fmt;
use thiserror::Error;

/// Main error type for exporter operations.
#[derive(Debug, Error)]
pub enum ExporterError {
    /// Error talking to a device
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The device answered but rejected the query
    #[error("device error: {0}")]
    Device(String),

    /// Error decoding a device reply
    #[error("Failed to parse device response: {0}")]
    ParseError(String),

    /// Malformed query argument
    #[error("invalid query argument: {0}")]
    InvalidQuery(String),

    /// A property value could not be converted to a metric value
    #[error("parse {property} value {value:?} error: {source}")]
    Conversion {
        property: String,
        value: String,
        #[source]
        source: ParseValueError,
    },

    /// Two collectors registered under the same key
    #[error("collector {0:?} is already registered")]
    DuplicateRegistration(String),

    /// A configured collector key has no registry entry
    #[error("unknown collector {0:?}")]
    UnknownCollector(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Metrics error
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// HTTP server error
    #[error("HTTP server error: {0}")]
    Server(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error annotated with the item that produced it
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ExporterError>,
    },

    /// Several independent failures
    #[error(transparent)]
    Multiple(#[from] MultiError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl ExporterError {
    /// Wrap the error with a description of the item that produced it.
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for exporter operations.
pub type Result<T> = std::result::Result<T, ExporterError>;

/// Failure to turn a raw property string into a number.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseValueError {
    #[error("invalid number: {0}")]
    Number(#[from] std::num::ParseFloatError),

    #[error("invalid boolean {0:?}")]
    Bool(String),

    #[error("invalid duration {0:?}")]
    Duration(String),

    #[error("{0}")]
    Custom(String),
}

/// Ordered collection of independent failures.
///
/// Loops over sub-items (interfaces, rows, devices) push every failure here
/// and keep going; [`MultiError::into_result`] turns the accumulator into
/// `Ok(())` when nothing failed, or a single [`ExporterError::Multiple`]
/// listing every member in the order it was recorded.
#[derive(Debug, Default)]
pub struct MultiError {
    errors: Vec<ExporterError>,
}

impl MultiError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure. Nested aggregates are flattened into this one.
    pub fn push(&mut self, err: ExporterError) {
        match err {
            ExporterError::Multiple(inner) => self.errors.extend(inner.errors),
            other => self.errors.push(other),
        }
    }

    /// Record the error of `result`, if any, and hand back the success value.
    pub fn append<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.push(err);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ExporterError] {
        &self.errors
    }

    /// `Ok(())` when empty, otherwise the combined error.
    pub fn into_result(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ExporterError::Multiple(self))
        }
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.errors.len() == 1 { "error" } else { "errors" };
        write!(f, "{} {} occurred:", self.errors.len(), noun)?;
        for err in &self.errors {
            write!(f, "\n\t* {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}

impl Extend<ExporterError> for MultiError {
    fn extend<I: IntoIterator<Item = ExporterError>>(&mut self, iter: I) {
        for err in iter {
            self.push(err);
        }
    }
}

impl FromIterator<ExporterError> for MultiError {
    fn from_iter<I: IntoIterator<Item = ExporterError>>(iter: I) -> Self {
        let mut multi = Self::new();
        multi.extend(iter);
        multi
    }
}
