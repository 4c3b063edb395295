//! Unified application error types for FileTree.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. Tree-specific failure modes get their
//! own [`ErrorKind`] so callers can branch on them without parsing messages.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested item was not found.
    NotFound,
    /// A sibling with the same name and kind already exists.
    DuplicateName,
    /// The move would nest a folder inside itself or one of its descendants.
    WouldCreateCycle,
    /// The item already lives under the requested parent.
    AlreadyInPlace,
    /// A dangling reference or otherwise impossible record was read from the store.
    StoreInconsistency,
    /// A walk over the parent links looped or exceeded the depth bound.
    CorruptHierarchy,
    /// A cascading delete removed only part of a subtree.
    PartialDelete,
    /// Input validation failed.
    Validation,
    /// The item changed between validation and commit.
    ConcurrentModification,
    /// A bounded operation did not finish in time.
    Timeout,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Human-readable summary shown to end users for this kind of failure.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::NotFound => "The item does not exist or was already deleted.",
            Self::DuplicateName => "An item with this name and type already exists in this folder.",
            Self::WouldCreateCycle => "A folder cannot be moved into itself or one of its subfolders.",
            Self::AlreadyInPlace => "The item is already in the selected folder.",
            Self::StoreInconsistency => "The stored tree references an item that does not exist.",
            Self::CorruptHierarchy => "The stored tree contains a loop or is nested too deeply.",
            Self::PartialDelete => "The folder was only partially deleted.",
            Self::Validation => "The request is invalid.",
            Self::ConcurrentModification => "The item was changed by someone else. Try again.",
            Self::Timeout => "The operation took too long and was cancelled.",
            Self::Database => "The item store is unavailable.",
            Self::Configuration => "The application is misconfigured.",
            Self::Serialization => "Data could not be encoded or decoded.",
            Self::Internal => "An unexpected error occurred.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::DuplicateName => write!(f, "DUPLICATE_NAME"),
            Self::WouldCreateCycle => write!(f, "WOULD_CREATE_CYCLE"),
            Self::AlreadyInPlace => write!(f, "ALREADY_IN_PLACE"),
            Self::StoreInconsistency => write!(f, "STORE_INCONSISTENCY"),
            Self::CorruptHierarchy => write!(f, "CORRUPT_HIERARCHY"),
            Self::PartialDelete => write!(f, "PARTIAL_DELETE"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::ConcurrentModification => write!(f, "CONCURRENT_MODIFICATION"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout FileTree.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the entire application boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a duplicate-name error.
    pub fn duplicate_name(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateName, message)
    }

    /// Create a would-create-cycle error.
    pub fn would_create_cycle(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::WouldCreateCycle, message)
    }

    /// Create an already-in-place error.
    pub fn already_in_place(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyInPlace, message)
    }

    /// Create a store-inconsistency error.
    pub fn store_inconsistency(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StoreInconsistency, message)
    }

    /// Create a corrupt-hierarchy error.
    pub fn corrupt_hierarchy(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CorruptHierarchy, message)
    }

    /// Create a partial-delete error.
    pub fn partial_delete(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PartialDelete, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a concurrent-modification error.
    pub fn concurrent_modification(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConcurrentModification, message)
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether this error only reports that nothing needed to change.
    pub fn is_no_op(&self) -> bool {
        self.kind == ErrorKind::AlreadyInPlace
    }

    /// The user-facing message for this error's kind.
    pub fn user_message(&self) -> &'static str {
        self.kind.describe()
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Invalid configuration: {err}"),
            err,
        )
    }
}
