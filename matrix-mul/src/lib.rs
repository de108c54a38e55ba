//! Parallel matrix multiplication with per-worker producer processes.
//!
//! `matrix-mul` computes `R = A × B` by splitting R's rows among a fixed
//! number of workers. Each worker hands its arithmetic to a producer process
//! (this same binary in producer mode) and collects the products from the
//! producer's stdout, one fixed-size frame per element. Once its rows are in,
//! the worker reports the producer's pid to the `thread_info` statistics
//! channel; those exchanges are serialized by a single lock.
//!
//! # Layout
//!
//! - **Partitioning**: `rows / workers` rows each, the first
//!   `rows % workers` workers take one extra
//! - **Backends**: `piped` (producer process + pipe) or `inline`
//!   (in-process, same results)
//! - **Result**: written to `result.txt` as `"<rows> <cols>"` and one line
//!   per row
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use matrix_mul::{Coordinator, InlineBackend, Matrix, MatrixMul};
//! use thread_info::StubChannel;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let a = Matrix::from_rows(vec![vec![1, 2], vec![3, 4]])?;
//!     let b = Matrix::from_rows(vec![vec![5, 6], vec![7, 8]])?;
//!
//!     let coordinator = Coordinator::new(Box::new(StubChannel::new().with_fallback(0, 0)))
//!         .with_pause(Duration::ZERO);
//!     let mm = MatrixMul::new(2, Arc::new(InlineBackend), coordinator);
//!
//!     let (result, _) = mm.multiply(Arc::new(a), Arc::new(b)).await?;
//!     assert_eq!(result.to_rows(), vec![vec![19, 22], vec![43, 50]]);
//!
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod coordinator;
mod error;
pub mod frame;
mod matrix;
mod matrix_mul;
pub mod partition;
pub mod producer;
pub mod worker;

pub use backend::{InlineBackend, PipedBackend, RowBackend};
pub use config::{BackendKind, Config};
pub use coordinator::Coordinator;
pub use error::Error;
pub use matrix::Matrix;
pub use matrix_mul::{MatrixMul, RunReport, RunStatistics};
pub use partition::{Task, partition};
