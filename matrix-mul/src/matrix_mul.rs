//! Parallel matrix multiplication orchestrator.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use thread_info::ProcFileChannel;
use tracing::{error, info};

use crate::backend::{InlineBackend, PipedBackend, RowBackend};
use crate::config::{BackendKind, Config};
use crate::coordinator::Coordinator;
use crate::partition::partition;
use crate::worker::{Worker, WorkerContext, WorkerReport};
use crate::{Error, Matrix};

/// Timing of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatistics {
    pub started_at: DateTime<Utc>,
    /// Monotonic time from launching the first worker to joining the last.
    pub elapsed: Duration,
}

impl RunStatistics {
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed.as_secs()
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub stats: RunStatistics,
    /// One entry per worker, in task order.
    pub workers: Vec<WorkerReport>,
}

/// Parallel matrix multiplication coordinator.
///
/// `MatrixMul` splits the result rows among a fixed number of workers, runs
/// them concurrently, and assembles their row blocks into the result. Each
/// worker's diagnostic exchange goes through the shared [`Coordinator`].
#[derive(Debug)]
pub struct MatrixMul {
    workers: usize,
    backend: Arc<dyn RowBackend>,
    coordinator: Arc<Coordinator>,
}

impl MatrixMul {
    pub fn new(workers: usize, backend: Arc<dyn RowBackend>, coordinator: Coordinator) -> Self {
        Self {
            workers,
            backend,
            coordinator: Arc::new(coordinator),
        }
    }

    /// Wires the backend and the `/proc` channel named by `config`.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        config.validate()?;
        let backend: Arc<dyn RowBackend> = match config.backend {
            BackendKind::Piped => Arc::new(PipedBackend::current_exe()?),
            BackendKind::Inline => Arc::new(InlineBackend),
        };
        let coordinator = Coordinator::new(Box::new(ProcFileChannel::new(&config.proc_file)))
            .with_pause(config.lock_pause);

        Ok(Self::new(config.workers, backend, coordinator))
    }

    /// Computes `a * b`.
    ///
    /// Fails before any worker starts if the matrices are not conformable or
    /// the worker count does not fit the row count. If any worker fails, the
    /// first failure (in task order) is returned and no result is produced.
    pub async fn multiply(
        &self,
        a: Arc<Matrix>,
        b: Arc<Matrix>,
    ) -> Result<(Matrix, RunReport), Error> {
        if !a.conformable(&b) {
            return Err(Error::DimensionMismatch(a.rows(), a.cols(), b.rows(), b.cols()));
        }

        let mut result = Matrix::zeros(a.rows(), b.cols());
        let tasks = partition(result.rows(), self.workers)?;

        println!("PID:{}", std::process::id());
        info!(
            rows = result.rows(),
            cols = result.cols(),
            workers = self.workers,
            backend = self.backend.name(),
            "starting multiplication"
        );

        let ctx = WorkerContext {
            a,
            b,
            backend: Arc::clone(&self.backend),
            coordinator: Arc::clone(&self.coordinator),
        };

        let started_at = Utc::now();
        let start = Instant::now();
        let handles: Vec<_> = tasks
            .iter()
            .enumerate()
            .map(|(index, &task)| tokio::spawn(Worker::new(index, task, ctx.clone()).run()))
            .collect();
        let outcomes = join_all(handles).await;
        let elapsed = start.elapsed();

        let mut reports = Vec::with_capacity(outcomes.len());
        let mut first_failure = None;
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome.map_err(Error::from).and_then(|r| r) {
                Ok(output) => {
                    result.fill_rows(output.block.task().start_row, output.block.values());
                    reports.push(output.report);
                }
                Err(e) => {
                    error!(worker = index, error = %e, "worker failed");
                    first_failure.get_or_insert(Error::Worker {
                        index,
                        source: Box::new(e),
                    });
                }
            }
        }
        if let Some(e) = first_failure {
            return Err(e);
        }

        let stats = RunStatistics {
            started_at,
            elapsed,
        };
        info!(
            started_at = %started_at.to_rfc3339(),
            elapsed_ms = elapsed.as_millis() as u64,
            "multiplication finished"
        );

        Ok((
            result,
            RunReport {
                stats,
                workers: reports,
            },
        ))
    }

    /// Computes `a * b` and writes it to `output`, replacing the file.
    ///
    /// Nothing is written if the multiplication fails.
    pub async fn run(
        &self,
        a: Arc<Matrix>,
        b: Arc<Matrix>,
        output: impl AsRef<Path>,
    ) -> Result<RunReport, Error> {
        let (result, report) = self.multiply(a, b).await?;
        result.write_to(&output).await?;
        info!(path = %output.as_ref().display(), "result written");
        Ok(report)
    }
}
