//! Error types for souschef

use thiserror::Error;

/// Result type alias for souschef operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in souschef
///
/// Absence of speech, an empty model reply, and stopping a recorder that was
/// never started are NOT errors; those surface as `Ok(String::new())` and
/// `Ok(None)` at their call sites and abort the turn normally.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Microphone access refused or input hardware unavailable
    #[error("microphone permission denied: {0}")]
    Permission(String),

    /// Audio hardware or encoding error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech transcription failed (network/auth/service)
    #[error("transcription failed: {0}")]
    Transcription(String),

    /// Chat-completion reply generation failed
    #[error("reply generation failed: {0}")]
    Generation(String),

    /// Speech synthesis failed
    #[error("synthesis failed: {0}")]
    Synthesis(String),

    /// Ingredient vision analysis failed
    #[error("vision error: {0}")]
    Vision(String),

    /// Recipe image lookup failed
    #[error("image search error: {0}")]
    ImageSearch(String),

    /// Auth provider error (sign in/up/out)
    #[error("auth error: {0}")]
    Auth(String),

    /// Document store read/write failed
    #[error("store error: {0}")]
    Store(String),

    /// Persona not found
    #[error("persona not found: {0}")]
    PersonaNotFound(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
