//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Two distinct types were mapped to the same schema id.
    ///
    /// Not retried. The caller has to supply a disambiguating schema id selector.
    #[from(ignore)]
    #[display(
        "Conflicting schemaIds: identical schemaId '{schema_id}' detected for types {existing} and {incoming}"
    )]
    SchemaIdCollision {
        /// The contested schema id.
        schema_id: String,
        /// Full name of the type that claimed the id first.
        existing: String,
        /// Full name of the type that attempted to claim it.
        incoming: String,
    },

    /// A type handle that is not present in the catalog.
    #[from(ignore)]
    #[display("Unknown type: {_0}")]
    UnknownType(String),

    /// The contract resolver could not classify a type.
    #[from(ignore)]
    #[display("Unsupported type: {_0}")]
    UnsupportedType(String),

    /// Raised by a schema or document filter.
    #[from(ignore)]
    #[display("Filter Error: {_0}")]
    Filter(String),

    /// Two operations share the same HTTP method and path.
    #[from(ignore)]
    #[display("Conflicting operations: {_0}")]
    DuplicateOperation(String),

    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;
