/// Error types for the configurator
///
/// Each layer has its own enum so callers can tell a degenerate optical
/// setup apart from a malformed form entry or a broken catalog file.
/// Metrics that cannot be computed yet are *not* errors; see
/// `optics::metrics::Computed`.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of one of the geometric relations.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum GeometryError {
    /// A value the relation divides by is zero.
    #[error("degenerate geometry: {divisor} cannot be zero")]
    DegenerateGeometry { divisor: &'static str },
    /// The solved value does not fit in a finite float.
    #[error("degenerate geometry: {field} overflows")]
    Overflow { field: &'static str },
}

/// Malformed user input on a catalog add or a field commit.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("{field} must be a positive integer, got '{input}'")]
    NotPositiveInteger { field: &'static str, input: String },
    #[error("{field} must be a positive number, got '{input}'")]
    NotPositiveFloat { field: &'static str, input: String },
    /// Field commits and motion inputs accept zero but nothing negative or non-finite.
    #[error("{field} must be a finite, non-negative number, got '{input}'")]
    InvalidValue { field: &'static str, input: String },
    #[error("a {kind} named '{name}' already exists")]
    DuplicateName { kind: &'static str, name: String },
}

/// Catalog file could not be read, parsed or written.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Failure of a session event. The session state is left as it was before the event.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Degenerate(#[from] GeometryError),
    #[error("unknown camera '{0}'")]
    UnknownCamera(String),
    #[error("unknown lens '{0}'")]
    UnknownLens(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// An event arrived while a settle pass was running and was dropped.
    #[error("a settle pass is already in progress")]
    SettleInProgress,
}

/// Settings file could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read settings {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid settings {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_value() {
        let err = ValidationError::NotPositiveInteger {
            field: "resolution_x",
            input: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "resolution_x must be a positive integer, got 'abc'");

        let err = GeometryError::DegenerateGeometry { divisor: "focal_mm" };
        assert_eq!(err.to_string(), "degenerate geometry: focal_mm cannot be zero");
    }

    #[test]
    fn test_session_error_wraps_geometry() {
        let err: SessionError = GeometryError::DegenerateGeometry { divisor: "fov_mm" }.into();
        assert!(matches!(err, SessionError::Degenerate(_)));
    }
}
