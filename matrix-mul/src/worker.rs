//! One worker: compute a task, report its producer, reap it.

use std::sync::Arc;

use thread_info::ThreadStats;
use tracing::{debug, warn};

use crate::backend::{Computed, RowBackend, RowBlock};
use crate::coordinator::Coordinator;
use crate::partition::Task;
use crate::{Error, Matrix};

/// Everything a worker shares with the rest of the run.
///
/// A and B are read-only; the coordinator is the only state workers
/// contend on.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    pub a: Arc<Matrix>,
    pub b: Arc<Matrix>,
    pub backend: Arc<dyn RowBackend>,
    pub coordinator: Arc<Coordinator>,
}

/// What a finished worker tells the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub index: usize,
    pub task: Task,
    /// Pid of the producer process, if the backend used one.
    pub producer_pid: Option<u32>,
    /// `None` when the diagnostic exchange failed.
    pub stats: Option<ThreadStats>,
}

#[derive(Debug)]
pub struct WorkerOutput {
    pub report: WorkerReport,
    pub block: RowBlock,
}

pub struct Worker {
    index: usize,
    task: Task,
    ctx: WorkerContext,
}

impl Worker {
    pub fn new(index: usize, task: Task, ctx: WorkerContext) -> Self {
        Self { index, task, ctx }
    }

    /// Runs the worker to completion.
    ///
    /// Computation failures abort the worker. A failed diagnostic exchange
    /// only costs the statistics: the rows are already computed.
    pub async fn run(self) -> Result<WorkerOutput, Error> {
        let Self { index, task, ctx } = self;
        debug!(
            worker = index,
            start_row = task.start_row,
            end_row = task.end_row,
            backend = ctx.backend.name(),
            "worker started"
        );

        let Computed { block, producer } = ctx
            .backend
            .compute(Arc::clone(&ctx.a), Arc::clone(&ctx.b), task)
            .await?;

        // Without a producer the worker reports on its own process.
        let producer_pid = producer.as_ref().map(|p| p.pid());
        let pid = producer_pid.unwrap_or_else(std::process::id);

        let stats = match ctx.coordinator.report(pid).await {
            Ok(stats) => {
                println!("\t{}", stats);
                Some(stats)
            }
            Err(e) => {
                warn!(worker = index, pid, error = %e, "diagnostic exchange failed");
                None
            }
        };

        if let Some(producer) = producer {
            producer.reap().await?;
        }

        debug!(worker = index, "worker finished");
        Ok(WorkerOutput {
            report: WorkerReport {
                index,
                task,
                producer_pid,
                stats,
            },
            block,
        })
    }
}
