//! Row partitioning across workers.

use std::ops::Range;

use crate::Error;

/// Half-open range of result rows assigned to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task {
    pub start_row: usize,
    pub end_row: usize,
}

impl Task {
    pub fn rows(&self) -> Range<usize> {
        self.start_row..self.end_row
    }

    pub fn len(&self) -> usize {
        self.end_row - self.start_row
    }

    pub fn is_empty(&self) -> bool {
        self.start_row == self.end_row
    }
}

/// Splits `total_rows` into `workers` contiguous tasks.
///
/// Every worker gets `total_rows / workers` rows and the first
/// `total_rows % workers` get one more, so sizes differ by at most one and
/// the tasks cover `[0, total_rows)` in order. Fails when `workers` is zero
/// or larger than `total_rows`.
pub fn partition(total_rows: usize, workers: usize) -> Result<Vec<Task>, Error> {
    if workers == 0 || workers > total_rows {
        return Err(Error::InvalidWorkerCount {
            workers,
            rows: total_rows,
        });
    }

    let base = total_rows / workers;
    let extra = total_rows % workers;

    let mut tasks = Vec::with_capacity(workers);
    let mut start_row = 0;
    for n in 0..workers {
        let len = if n < extra { base + 1 } else { base };
        tasks.push(Task {
            start_row,
            end_row: start_row + len,
        });
        start_row += len;
    }

    Ok(tasks)
}
