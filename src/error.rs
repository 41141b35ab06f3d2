use std::path::PathBuf;
use thiserror::Error;

/// Main error type for xmlgraph
#[derive(Error, Debug)]
pub enum XmlGraphError {
    /// Input file does not exist
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed XML
    #[error("XML error: {0}")]
    Xml(String),

    /// A configured path did not resolve in the document
    #[error("Missing field: {0}")]
    MissingField(String),

    /// Graph database errors (connection or query)
    #[error("Database error: {0}")]
    Database(#[from] neo4rs::Error),

    /// A query result did not have the expected shape
    #[error("Unexpected query result: {0}")]
    Decode(String),

    /// The link target matched no node
    #[error("No {label} node with {key} = {value:?}")]
    NoMatch {
        label: String,
        key: String,
        value: String,
    },

    /// The link target matched several nodes and the policy forbids fan-out
    #[error("{count} {label} nodes with {key} = {value:?}, expected exactly one")]
    AmbiguousMatch {
        label: String,
        key: String,
        value: String,
        count: usize,
    },

    /// Label, relationship type or property key that cannot be used in Cypher
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenient Result type using XmlGraphError
pub type Result<T> = std::result::Result<T, XmlGraphError>;
