use thiserror::Error;

/// Unified error type for the entire signal-board-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── File I/O ────────────────────────────────────────────────────
    #[error("File I/O error: {0}")]
    FileIO(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── Data sources ────────────────────────────────────────────────
    #[error("Directory scan failed for {root}: {message}")]
    Scan { root: String, message: String },

    #[error("Failed to load data file {path}: {message}")]
    DataFile { path: String, message: String },

    #[error("Network error: {0}")]
    Network(String),

    // ── Realtime store ──────────────────────────────────────────────
    #[error("Store error ({collection}.{operation}): {message}")]
    Store {
        collection: String,
        operation: String,
        message: String,
    },

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid settings: {0}")]
    Config(String),
}

impl CoreError {
    /// Shorthand for a failed store call.
    pub fn store(
        collection: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CoreError::Store {
            collection: collection.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Strip query parameters: listing endpoints may carry access tokens.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
