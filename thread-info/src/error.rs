//! Error types for the diagnostic channel.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("diagnostic channel I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no process with id {0}")]
    UnknownProcess(u32),

    #[error("malformed response: {0:?}")]
    Malformed(String),

    #[error("channel closed without a response")]
    ConnectionClosed,
}
