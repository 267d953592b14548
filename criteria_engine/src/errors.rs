use thiserror::Error;

/// Errors raised while compiling a criteria object into SQL.
///
/// Every variant is detected synchronously during a build and none of them is
/// retryable: the engine is deterministic, so the same input fails the same way.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Column {column} already exists for table {table}")]
    DuplicateName { table: String, column: String },

    #[error("Field '{field}' has unsupported type for {directive} directive: {found}")]
    UnsupportedFieldType {
        field: String,
        directive: &'static str,
        found: &'static str,
    },

    #[error("Invalid {kind} value: {value}")]
    InvalidEnumValue { kind: &'static str, value: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl QueryError {
    pub(crate) fn invalid_enum(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidEnumValue {
            kind,
            value: value.into(),
        }
    }
}

pub type QueryResult<T> = Result<T, QueryError>;
