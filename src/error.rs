//! Error types for playlist loading

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaylistError {
    /// The input handed to a parser is not playlist text
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP error: {0}")]
    Http(u16),

    #[error("read failed: {0}")]
    Read(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A background load ended without producing a result
    #[error("worker failed: {0}")]
    Worker(String),

    #[error("config error: {0}")]
    Config(String),
}

impl From<std::str::Utf8Error> for PlaylistError {
    fn from(e: std::str::Utf8Error) -> Self {
        PlaylistError::InvalidInput(format!("playlist is not UTF-8 text ({})", e))
    }
}

pub type Result<T> = std::result::Result<T, PlaylistError>;
