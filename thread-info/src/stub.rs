//! In-memory provider for tests and machines without the kernel module.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::{DiagnosticChannel, Error, ThreadStats};

/// Answers queries from a fixed table.
///
/// Known pids get their recorded statistics. Unknown pids behave like the
/// real provider (the request is echoed, surfacing as
/// [`Error::UnknownProcess`]) unless a fallback record is configured, in
/// which case the fallback is returned under the queried pid.
#[derive(Debug, Default)]
pub struct StubChannel {
    known: HashMap<u32, ThreadStats>,
    fallback: Option<ThreadStats>,
    queries: AtomicUsize,
}

impl StubChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_process(mut self, stats: ThreadStats) -> Self {
        self.known.insert(stats.thread_id, stats);
        self
    }

    pub fn with_fallback(mut self, elapsed_ms: u64, context_switches: u64) -> Self {
        self.fallback = Some(ThreadStats {
            thread_id: 0,
            elapsed_ms,
            context_switches,
        });
        self
    }

    /// Number of queries answered so far, including failed ones.
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiagnosticChannel for StubChannel {
    async fn query(&self, pid: u32) -> Result<ThreadStats, Error> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        if let Some(stats) = self.known.get(&pid) {
            return Ok(*stats);
        }
        match self.fallback {
            Some(template) => Ok(ThreadStats {
                thread_id: pid,
                ..template
            }),
            None => ThreadStats::parse_response(pid, &format!("{}\n", pid)),
        }
    }
}
