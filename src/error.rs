//! Error types for the tour guide.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Tour error: {0}")]
    Tour(#[from] TourError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Tour {tour_id} has no steps")]
    EmptyTour { tour_id: String },

    #[error("Tour {tour_id} has duplicate step id {step_id}")]
    DuplicateStep { tour_id: String, step_id: String },
}

/// Key-value storage errors.
///
/// These never escape the tour store; they are logged and the operation
/// degrades to a no-op or an absent result.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Read failed for key {key}: {reason}")]
    Read { key: String, reason: String },

    #[error("Write failed for key {key}: {reason}")]
    Write { key: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors talking to the remote tour backend.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("Request to {path} failed: {reason}")]
    RequestFailed { path: String, reason: String },

    #[error("{path} returned HTTP {status}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {path}: {reason}")]
    InvalidResponse { path: String, reason: String },
}

/// Structural misuse of the widget API.
#[derive(Debug, thiserror::Error)]
pub enum TourError {
    #[error("TourGuide is not initialized; call init() first")]
    NotInitialized,

    #[error("Tour {tour_id} is not started")]
    NotStarted { tour_id: String },

    #[error("Widget for tour {tour_id} has been destroyed")]
    Destroyed { tour_id: String },
}

/// Result type alias for the tour guide.
pub type Result<T> = std::result::Result<T, Error>;
