//! Crate-level error types.

use std::fmt;

use crate::gpu::render_context::RenderContextError;

/// Errors produced by the texstream crate.
#[derive(Debug)]
pub enum StreamError {
    /// No display surface, adapter or device could be acquired.
    Setup(RenderContextError),
    /// Window or event-loop failure.
    Window(String),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    Options(String),
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup(e) => write!(f, "GPU setup failed: {e}"),
            Self::Window(msg) => write!(f, "window error: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Options(msg) => write!(f, "options error: {msg}"),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Setup(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderContextError> for StreamError {
    fn from(e: RenderContextError) -> Self {
        Self::Setup(e)
    }
}

impl From<std::io::Error> for StreamError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
