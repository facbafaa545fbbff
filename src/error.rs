//! Error types for the field tracker.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Backup error: {0}")]
    Backup(#[from] BackupError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Backup encode/decode errors.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("Failed to encode snapshot: {0}")]
    Encode(String),

    #[error("Failed to decode snapshot: {0}")]
    Decode(String),

    #[error("Unsupported snapshot version {found} (max supported {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejected input on a write path.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Work record ends before it starts ({start} >= {end})")]
    InvalidTimeRange { start: String, end: String },

    #[error("Unknown worker {0}")]
    UnknownWorker(i64),

    #[error("Unknown project {0}")]
    UnknownProject(i64),
}

/// Result type alias for the tracker.
pub type Result<T> = std::result::Result<T, Error>;
