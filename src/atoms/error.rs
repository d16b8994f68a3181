// Parley Atoms: Error Types
// Single canonical error enum for the client, built with `thiserror`.
//
// Design rules:
//   • Variants are coarse-grained by domain (I/O, Network, Api, Audio…).
//   • The `#[from]` attribute wires std/external error conversions automatically.
//   • No variant carries secret material (tokens, passwords) in its message.

use thiserror::Error;

// ── Primary error enum ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ClientError {
    /// Filesystem or OS-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP / network failure (reqwest layer).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Backend rejected the request with a non-2xx status.
    #[error("Server error {status}: {message}")]
    Api { status: u16, message: String },

    /// Authentication / authorization failure (401/403, missing token…).
    #[error("Auth error: {0}")]
    Auth(String),

    /// Microphone acquisition or audio encoding failure.
    #[error("Audio error: {0}")]
    Audio(String),

    /// Client configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catch-all for errors that do not yet have a dedicated variant.
    /// Prefer adding a specific variant over using this in new code.
    #[error("{0}")]
    Other(String),
}

// ── String bridges ─────────────────────────────────────────────────────────
// Allow `?` on helpers still returning `Result<T, String>` inside functions
// that return `ClientResult<T>`.

impl From<String> for ClientError {
    fn from(s: String) -> Self {
        ClientError::Other(s)
    }
}

impl From<&str> for ClientError {
    fn from(s: &str) -> Self {
        ClientError::Other(s.to_string())
    }
}

// ── Convenience alias ──────────────────────────────────────────────────────

/// All client operations should return this type.
pub type ClientResult<T> = Result<T, ClientError>;
