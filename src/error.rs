use thiserror::Error;

/// Main error type for hetgraph
#[derive(Error, Debug)]
pub enum HetgraphError {
    /// Artifact database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV input
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A present source table lacks a column the relation schema requires
    #[error("Schema mismatch: table '{table}' has no column '{column}'")]
    SchemaMismatch { table: String, column: String },

    /// Artifact contents that do not decode into a graph
    #[error("Artifact format error: {0}")]
    Artifact(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenient Result type using HetgraphError
pub type Result<T> = std::result::Result<T, HetgraphError>;
