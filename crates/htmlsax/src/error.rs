//! Errors reported through `Handler::on_error`.
//!
//! Nothing here is ever returned from `write`/`end`: malformed markup degrades
//! to text, and the two reportable classes (lifecycle misuse, handler faults)
//! are routed to the handler's error channel.

use thiserror::Error;

/// Result type returned by handler callbacks.
pub type HandlerResult = Result<(), HandlerError>;

/// Opaque error raised by a handler callback.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HandlerError(Box<dyn std::error::Error + Send + Sync>);

impl HandlerError {
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(err.into())
    }

    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync> {
        self.0
    }
}

impl From<String> for HandlerError {
    fn from(msg: String) -> Self {
        Self::new(msg)
    }
}

impl From<&str> for HandlerError {
    fn from(msg: &str) -> Self {
        Self::new(msg)
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err)
    }
}

impl From<std::fmt::Error> for HandlerError {
    fn from(err: std::fmt::Error) -> Self {
        Self::new(err)
    }
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error(".write() after done!")]
    WriteAfterDone,
    #[error(".end() after done!")]
    EndAfterDone,
    #[error("handler callback `{callback}` failed: {source}")]
    Handler {
        callback: &'static str,
        #[source]
        source: HandlerError,
    },
}

impl ParserError {
    /// True for the lifecycle-misuse class (`write`/`end` after done).
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::WriteAfterDone | Self::EndAfterDone)
    }
}
