//! Database error types.
//!
//! Provides the error kinds shared by all RillDB components.

use std::fmt;
use thiserror::Error;

/// Error codes for categorizing errors.
///
/// These codes can be used for programmatic error handling and are stable
/// across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Unknown or unspecified error.
    Unknown = 0x0000,
    /// Internal error (bug).
    Internal = 0x0001,
    /// Invalid argument provided.
    InvalidArgument = 0x0002,
    /// Lookup returned nothing.
    NotFound = 0x0003,

    // I/O errors (0x0100 - 0x01FF)
    /// General I/O error.
    Io = 0x0100,

    // Record errors (0x0200 - 0x02FF)
    /// Record layout or write overflowed the signed 31-bit offset space.
    RecordTooLarge = 0x0200,
    /// Null datum written into a non-nullable field.
    NullConstraint = 0x0201,

    // Catalog errors (0x0300 - 0x03FF)
    /// Init-file tokenization or a type input function failed.
    InputParse = 0x0300,
    /// Catalog corruption detected.
    CatalogIntegrity = 0x0301,
    /// Name collision on a catalog insertion.
    AlreadyExists = 0x0302,
    /// The monotonic object ID allocator is exhausted.
    OidExhausted = 0x0303,
    /// No default comparison operator registered for a type.
    MissingOperator = 0x0304,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x01 => "I/O",
            0x02 => "Record",
            0x03 => "Catalog",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The main error type for RillDB.
///
/// Recoverable conditions are returned as values of this type; the small set
/// of fatal conditions (catalog corruption, object ID exhaustion) also use
/// this type but callers are expected to let them unwind to the top level.
#[derive(Debug, Error)]
pub enum RillError {
    /// Internal error - this indicates a bug.
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },

    /// Invalid argument provided.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Error message.
        message: String,
    },

    /// Lookup by OID or by name returned nothing.
    ///
    /// Cache misses are surfaced as absent results, not as this error; this
    /// variant is for lookups whose target is required to exist, such as an
    /// unregistered function OID at a call site.
    #[error("{what} not found")]
    NotFound {
        /// Description of the missing object.
        what: String,
    },

    /// I/O error from the underlying system.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A record layout or payload write overflowed the signed 31-bit offset
    /// space.
    #[error("record too large")]
    RecordTooLarge,

    /// A null datum was written into a non-nullable field.
    #[error("NULL value in non-nullable field {field}")]
    NullConstraint {
        /// The offending field, in declaration order.
        field: i16,
    },

    /// Init-file tokenization or a type input function failed.
    #[error("init data parse error at line {line}: {message}")]
    InputParse {
        /// Line number in the init data file, 1-based.
        line: usize,
        /// Error message.
        message: String,
    },

    /// Catalog corruption: a supposedly-unique OID appears twice, an
    /// expected catalog row is missing, or the DB meta page fails
    /// validation. Fatal.
    #[error("catalog integrity violation: {message}")]
    CatalogIntegrity {
        /// Description of the corruption.
        message: String,
    },

    /// Name collision on a catalog insertion.
    #[error("{kind} '{name}' already exists")]
    AlreadyExists {
        /// The kind of object ("table", "index").
        kind: &'static str,
        /// The colliding name.
        name: String,
    },

    /// The monotonic object ID allocator reached its maximum. Fatal.
    #[error("object ID space exhausted")]
    OidExhausted,

    /// No default comparison operator is registered for a type.
    #[error("no {op} operator for type {typid}")]
    MissingOperator {
        /// The operator looked for ("<", "=").
        op: &'static str,
        /// The operand type OID.
        typid: u32,
    },
}

impl RillError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Internal { .. } => ErrorCode::Internal,
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::Io { .. } => ErrorCode::Io,
            Self::RecordTooLarge => ErrorCode::RecordTooLarge,
            Self::NullConstraint { .. } => ErrorCode::NullConstraint,
            Self::InputParse { .. } => ErrorCode::InputParse,
            Self::CatalogIntegrity { .. } => ErrorCode::CatalogIntegrity,
            Self::AlreadyExists { .. } => ErrorCode::AlreadyExists,
            Self::OidExhausted => ErrorCode::OidExhausted,
            Self::MissingOperator { .. } => ErrorCode::MissingOperator,
        }
    }

    /// Returns true if this error is fatal for the database instance.
    ///
    /// Fatal errors unwind to the top level and terminate the instance;
    /// everything else is recoverable at the call site.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::CatalogIntegrity { .. } | Self::OidExhausted | Self::Internal { .. }
        )
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Creates a catalog integrity error.
    #[must_use]
    pub fn corruption(message: impl Into<String>) -> Self {
        Self::CatalogIntegrity {
            message: message.into(),
        }
    }
}

/// Result type alias used across RillDB.
pub type RillResult<T> = Result<T, RillError>;
