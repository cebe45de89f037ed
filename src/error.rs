use thiserror::Error;

/// Main error type for Lexgraph
#[derive(Error, Debug)]
pub enum LexgraphError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A persisted collection could not be decoded. Fatal: the working set
    /// must never be rebuilt from partial data.
    #[error("Corrupt persisted state under '{key}': {source}")]
    CorruptState {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Encoding a value for persistence or export failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Word not found
    #[error("Word not found: {0}")]
    WordNotFound(String),

    /// Relation type not found
    #[error("Relation type not found: {0}")]
    RelationTypeNotFound(String),

    /// Part-of-speech type not found
    #[error("Part-of-speech type not found: {0}")]
    PosTypeNotFound(String),

    /// Project not found
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// A registry key is already taken
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// A registry key failed validation
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenient Result type using LexgraphError
pub type Result<T> = std::result::Result<T, LexgraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LexgraphError::Config("Test error".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("Test error"));
    }

    #[test]
    fn test_error_from_rusqlite() {
        let rusqlite_err = rusqlite::Error::InvalidQuery;
        let err: LexgraphError = rusqlite_err.into();
        assert!(matches!(err, LexgraphError::Database(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: LexgraphError = io_err.into();
        assert!(matches!(err, LexgraphError::Io(_)));
    }

    #[test]
    fn test_corrupt_state_names_key() {
        let source = serde_json::from_str::<Vec<u8>>("{not json").unwrap_err();
        let err = LexgraphError::CorruptState {
            key: "lexgraph.words".to_string(),
            source,
        };
        assert!(err.to_string().contains("lexgraph.words"));
    }
}
