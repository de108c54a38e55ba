//! The computation side of a piped worker.
//!
//! A producer is this same binary started with [`PRODUCE_FLAG`]. It reads its
//! job from stdin (the task's rows of A, then all of B, both in the matrix
//! text format), computes every element of those result rows and writes one
//! frame per element to stdout in row-major order. An element that
//! overflows `i64` is sent as an overflow frame and ends the job with
//! [`Error::Overflow`].

use std::io::{BufWriter, Read, Write};

use tracing::debug;

use crate::frame;
use crate::partition::Task;
use crate::{Error, Matrix};

/// Command-line switch selecting producer mode.
pub const PRODUCE_FLAG: &str = "--produce";

/// Builds the stdin payload for the producer of `task`.
pub fn encode_job(a: &Matrix, b: &Matrix, task: Task) -> String {
    format!("{}{}", a.slice_rows(task.start_row, task.end_row), b)
}

/// Runs one producer job, returning the number of frames written.
pub fn run<R: Read, W: Write>(mut input: R, output: W) -> Result<usize, Error> {
    let mut job = String::new();
    input.read_to_string(&mut job)?;

    let mut tokens = job.split_whitespace();
    let a = Matrix::from_tokens(&mut tokens)?;
    let b = Matrix::from_tokens(&mut tokens)?;
    if !a.conformable(&b) {
        return Err(Error::DimensionMismatch(a.rows(), a.cols(), b.rows(), b.cols()));
    }

    let mut out = BufWriter::new(output);
    let mut frames = 0;
    for r in 0..a.rows() {
        for c in 0..b.cols() {
            match a.product_cell(&b, r, c) {
                Ok(value) => out.write_all(&frame::encode(value))?,
                Err(e) => {
                    out.write_all(&frame::encode_overflow())?;
                    out.flush()?;
                    return Err(e);
                }
            }
            frames += 1;
        }
    }
    out.flush()?;

    debug!(frames, pid = std::process::id(), "producer finished");
    Ok(frames)
}
