//! Error types for ranker operations.

use thiserror::Error;

/// Errors that can occur when feeding training signal to the ranker.
///
/// All failures are caller input-validation failures, reported immediately
/// with no partial mutation; the ranker has no retryable failure modes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RankerError {
    /// The classification category is empty.
    ///
    /// Categories are candidate identifiers; an empty identifier can never
    /// label a training example.
    #[error("Classification category is empty")]
    EmptyCategory,
}

/// A specialized `Result` type for ranker operations.
pub type Result<T> = std::result::Result<T, RankerError>;
