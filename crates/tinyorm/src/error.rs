//! Error types for tinyorm

use thiserror::Error;

/// Error produced by a database collaborator (driver, connection, cursor).
pub type DbError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for tinyorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for database operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// Statement execution failed; the transaction has been rolled back.
    #[error("Query execution error: {source} (sql: {sql})")]
    QueryExecution {
        sql: String,
        #[source]
        source: DbError,
    },

    /// Commit after a successful statement failed.
    #[error("Commit error: {0}")]
    Commit(#[source] DbError),

    /// One-time field discovery for a model failed.
    #[error("Schema introspection failed for table `{table}`: {message}")]
    SchemaIntrospection { table: String, message: String },

    /// A model was used before `register` bound it to a database.
    #[error("Model `{0}` is not registered")]
    NotRegistered(&'static str),

    /// A field name that is not part of the table's columns.
    #[error("Unknown field `{field}` on table `{table}`")]
    UnknownField { table: String, field: String },

    /// A model hook rejected the operation.
    #[error("Hook error: {0}")]
    Hook(String),

    /// Record snapshot could not be encoded or rebuilt.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl OrmError {
    /// Create a query execution error for a statement
    pub fn query_execution(sql: impl Into<String>, source: DbError) -> Self {
        Self::QueryExecution {
            sql: sql.into(),
            source,
        }
    }

    /// Create a schema introspection error
    pub fn schema(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaIntrospection {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create an unknown field error
    pub fn unknown_field(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            table: table.into(),
            field: field.into(),
        }
    }

    /// Create a hook error
    pub fn hook(message: impl Into<String>) -> Self {
        Self::Hook(message.into())
    }

    /// Check if this is a statement execution error
    pub fn is_query_execution(&self) -> bool {
        matches!(self, Self::QueryExecution { .. })
    }

    /// Check if this is a schema introspection error
    pub fn is_schema_introspection(&self) -> bool {
        matches!(self, Self::SchemaIntrospection { .. })
    }

    /// Check if this is an unknown field error
    pub fn is_unknown_field(&self) -> bool {
        matches!(self, Self::UnknownField { .. })
    }
}
