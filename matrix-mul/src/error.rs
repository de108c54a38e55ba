//! Error types for matrix-mul operations.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed matrix: {0}")]
    Parse(String),

    #[error("matrix dimension mismatch: A is {0}x{1}, B is {2}x{3}")]
    DimensionMismatch(usize, usize, usize, usize),

    #[error("result element [{row}][{col}] overflows i64")]
    Overflow { row: usize, col: usize },

    #[error("invalid worker count {workers} for {rows} rows")]
    InvalidWorkerCount { workers: usize, rows: usize },

    #[error("cannot start producer {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("producer {0} pipe unavailable")]
    Pipe(&'static str),

    #[error("producer exited before its pid was recorded")]
    ProducerGone,

    #[error("producer closed the pipe after {received} of {expected} frames")]
    ShortRead { received: usize, expected: usize },

    #[error("bad frame: {0:?}")]
    Frame(String),

    #[error("producer {pid} exited with {status}")]
    Producer { pid: u32, status: ExitStatus },

    #[error("worker {index} failed: {source}")]
    Worker {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("worker task did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("configuration error: {0}")]
    Config(String),
}
