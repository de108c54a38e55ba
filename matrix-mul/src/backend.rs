//! Pluggable computation of one task's result rows.
//!
//! [`PipedBackend`] starts a producer process per task and collects its
//! frames from a pipe. [`InlineBackend`] computes the same rows inside this
//! process on the blocking thread pool. Both fill a [`RowBlock`] with
//! identical values.

use std::ffi::OsString;
use std::fmt::Debug;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::slice::ChunksExactMut;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tracing::debug;

use crate::frame::{self, FRAME_SIZE};
use crate::partition::Task;
use crate::producer::{self, PRODUCE_FLAG};
use crate::{Error, Matrix};

/// The result rows of one task, owned by its worker until merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowBlock {
    task: Task,
    cols: usize,
    values: Vec<i64>,
}

impl RowBlock {
    pub fn new(task: Task, cols: usize) -> Self {
        Self {
            task,
            cols,
            values: vec![0; task.len() * cols],
        }
    }

    pub fn task(&self) -> Task {
        self.task
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    pub fn rows_mut(&mut self) -> ChunksExactMut<'_, i64> {
        self.values.chunks_exact_mut(self.cols)
    }
}

/// A producer whose frames have been read but which has not been reaped.
#[derive(Debug)]
pub struct ProducerHandle {
    pid: u32,
    child: Child,
}

impl ProducerHandle {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Waits for the producer to exit; a failure status is an error.
    pub async fn reap(mut self) -> Result<(), Error> {
        let status = self.child.wait().await?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::Producer {
                pid: self.pid,
                status,
            })
        }
    }
}

/// Output of a backend: the filled rows and, for process backends, the
/// producer still waiting to be reaped.
#[derive(Debug)]
pub struct Computed {
    pub block: RowBlock,
    pub producer: Option<ProducerHandle>,
}

#[async_trait]
pub trait RowBackend: Send + Sync + Debug {
    /// Short name for logs ("piped", "inline").
    fn name(&self) -> &str;

    /// Computes rows `task` of `a * b`. The matrices are conformable and the
    /// task lies inside `a`.
    async fn compute(&self, a: Arc<Matrix>, b: Arc<Matrix>, task: Task) -> Result<Computed, Error>;
}

/// Computes rows in-process.
#[derive(Debug, Clone, Default)]
pub struct InlineBackend;

#[async_trait]
impl RowBackend for InlineBackend {
    fn name(&self) -> &str {
        "inline"
    }

    async fn compute(&self, a: Arc<Matrix>, b: Arc<Matrix>, task: Task) -> Result<Computed, Error> {
        let block = tokio::task::spawn_blocking(move || {
            let mut block = RowBlock::new(task, b.cols());
            for (r, row) in task.rows().zip(block.rows_mut()) {
                for (c, slot) in row.iter_mut().enumerate() {
                    *slot = a.product_cell(&b, r, c)?;
                }
            }
            Ok::<_, Error>(block)
        })
        .await??;

        Ok(Computed {
            block,
            producer: None,
        })
    }
}

/// Computes rows in a producer process and reads them back over its stdout.
#[derive(Debug, Clone)]
pub struct PipedBackend {
    program: PathBuf,
    args: Vec<OsString>,
}

impl PipedBackend {
    /// `program` must accept [`PRODUCE_FLAG`]; normally this binary.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self::with_args(program, [PRODUCE_FLAG])
    }

    /// A producer started as `program args...` instead of with
    /// [`PRODUCE_FLAG`]. It must speak the same stdin/stdout protocol.
    pub fn with_args<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn current_exe() -> Result<Self, Error> {
        Ok(Self::new(std::env::current_exe()?))
    }
}

#[async_trait]
impl RowBackend for PipedBackend {
    fn name(&self) -> &str {
        "piped"
    }

    async fn compute(&self, a: Arc<Matrix>, b: Arc<Matrix>, task: Task) -> Result<Computed, Error> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Error::Spawn {
                program: self.program.clone(),
                source,
            })?;
        let pid = child.id().ok_or(Error::ProducerGone)?;

        // The producer reads its whole job before writing any frame, so the
        // job can be written in full before reading starts.
        let mut stdin = child.stdin.take().ok_or(Error::Pipe("stdin"))?;
        stdin
            .write_all(producer::encode_job(&a, &b, task).as_bytes())
            .await?;
        drop(stdin);

        let mut stdout = child.stdout.take().ok_or(Error::Pipe("stdout"))?;
        let cols = b.cols();
        let mut block = RowBlock::new(task, cols);
        let expected = block.values().len();
        let mut buf = [0u8; FRAME_SIZE];
        for (received, slot) in block.values.iter_mut().enumerate() {
            match stdout.read_exact(&mut buf).await {
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                    return Err(Error::ShortRead { received, expected });
                }
                Err(e) => return Err(e.into()),
            }
            if frame::is_overflow(&buf) {
                return Err(Error::Overflow {
                    row: task.start_row + received / cols,
                    col: received % cols,
                });
            }
            *slot = frame::decode(&buf)?;
        }
        debug!(pid, frames = expected, "collected producer output");

        Ok(Computed {
            block,
            producer: Some(ProducerHandle { pid, child }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (Arc<Matrix>, Arc<Matrix>) {
        let a = Matrix::from_rows(vec![vec![1, 2], vec![3, 4], vec![5, 6]]).unwrap();
        let b = Matrix::from_rows(vec![vec![1, 0, 2], vec![0, 1, 3]]).unwrap();
        (Arc::new(a), Arc::new(b))
    }

    #[test]
    fn row_block_shape() {
        let mut block = RowBlock::new(Task { start_row: 2, end_row: 5 }, 4);
        assert_eq!(block.values().len(), 12);
        assert_eq!(block.rows_mut().count(), 3);
    }

    #[tokio::test]
    async fn inline_computes_task_rows() {
        let (a, b) = pair();
        let task = Task { start_row: 1, end_row: 3 };

        let computed = InlineBackend.compute(a, b, task).await.unwrap();

        assert!(computed.producer.is_none());
        assert_eq!(computed.block.task(), task);
        assert_eq!(computed.block.values(), &[3, 4, 18, 5, 6, 28]);
    }

    #[tokio::test]
    async fn inline_reports_overflow_position() {
        let big = i64::MAX / 2 + 1;
        let a = Matrix::from_rows(vec![vec![1, 1], vec![big, big]]).unwrap();
        let b = Matrix::from_rows(vec![vec![1], vec![1]]).unwrap();

        let err = InlineBackend
            .compute(Arc::new(a), Arc::new(b), Task { start_row: 0, end_row: 2 })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Overflow { row: 1, col: 0 }));
    }

    /// A producer played by `sh -c script`. The script drains its job first
    /// so the job write never hits a closed pipe.
    #[cfg(unix)]
    fn scripted(script: &str) -> PipedBackend {
        PipedBackend::with_args("sh", ["-c", &format!("cat >/dev/null; {script}")])
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn piped_short_output_is_short_read() {
        let (a, b) = pair();
        let backend = scripted("printf 7; head -c 31 /dev/zero; exit 0");

        let err = backend
            .compute(a, b, Task { start_row: 0, end_row: 1 })
            .await
            .unwrap_err();

        assert!(
            matches!(err, Error::ShortRead { received: 1, expected: 3 }),
            "{err:?}"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn piped_garbage_frame_is_rejected() {
        let (a, b) = pair();
        let backend = scripted("printf xyz; head -c 29 /dev/zero; exit 0");

        let err = backend
            .compute(a, b, Task { start_row: 0, end_row: 1 })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Frame(ref text) if text == "xyz"), "{err:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn piped_failed_exit_is_reported_on_reap() {
        let (a, b) = pair();
        let frames = "for v in 1 2 3; do printf $v; head -c 31 /dev/zero; done";
        let backend = scripted(&format!("{frames}; exit 1"));

        let computed = backend
            .compute(a, b, Task { start_row: 0, end_row: 1 })
            .await
            .unwrap();
        assert_eq!(computed.block.values(), &[1, 2, 3]);

        let producer = computed.producer.expect("piped backend keeps its producer");
        let pid = producer.pid();
        let err = producer.reap().await.unwrap_err();

        match err {
            Error::Producer { pid: failed, status } => {
                assert_eq!(failed, pid);
                assert_eq!(status.code(), Some(1));
            }
            other => panic!("expected producer failure, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn piped_overflow_frame_reports_position() {
        let (a, b) = pair();
        let backend = scripted(
            "printf 9; head -c 31 /dev/zero; printf overflow; head -c 24 /dev/zero; exit 1",
        );

        let err = backend
            .compute(a, b, Task { start_row: 2, end_row: 3 })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Overflow { row: 2, col: 1 }), "{err:?}");
    }

    #[tokio::test]
    async fn piped_reports_missing_program() {
        let (a, b) = pair();
        let backend = PipedBackend::new("/nonexistent/matrix-mul");

        let err = backend
            .compute(a, b, Task { start_row: 0, end_row: 1 })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Spawn { .. }));
    }
}
