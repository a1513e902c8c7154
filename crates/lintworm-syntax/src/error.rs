//! Error types surfaced by the syntax library.

use thiserror::Error;

/// A documentation template could not be compiled.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{kind} template: `{field}` is not a valid pattern: {source}")]
    InvalidPattern {
        kind: &'static str,
        field: &'static str,
        #[source]
        source: Box<regex::Error>,
    },
}

/// A file could not be scanned within its resource limits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("nesting deeper than {limit} spans at byte {offset}")]
    DepthExceeded { limit: usize, offset: usize },
    #[error("deadline exceeded at byte {offset}")]
    DeadlineExceeded { offset: usize },
}
