//! Request/response access to the statistics provider.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::{Error, ThreadStats};

/// Path of the provider's entry when the kernel module is loaded.
pub const DEFAULT_PROC_FILE: &str = "/proc/thread_info";

/// Same limit as the provider's internal buffer.
const MAX_RESPONSE: usize = 1024;

/// A source of per-process execution statistics.
///
/// One call is one request/response exchange. Implementations are not
/// required to tolerate interleaved exchanges; callers serialize them.
#[async_trait]
pub trait DiagnosticChannel: Send + Sync {
    /// Asks the provider about process `pid`.
    async fn query(&self, pid: u32) -> Result<ThreadStats, Error>;
}

/// Channel backed by a duplex file such as `/proc/thread_info`.
///
/// Every query opens the file, writes the request, and performs a single
/// read for the answer.
#[derive(Debug, Clone)]
pub struct ProcFileChannel {
    path: PathBuf,
}

impl ProcFileChannel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn exchange(&self, pid: u32) -> Result<String, Error> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .await
            .map_err(|source| Error::Open {
                path: self.path.clone(),
                source,
            })?;

        file.write_all(format!("{}\n", pid).as_bytes()).await?;
        file.flush().await?;

        let mut buf = vec![0u8; MAX_RESPONSE];
        let n = file.read(&mut buf).await?;
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }
        buf.truncate(n);

        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl Default for ProcFileChannel {
    fn default() -> Self {
        Self::new(DEFAULT_PROC_FILE)
    }
}

#[async_trait]
impl DiagnosticChannel for ProcFileChannel {
    async fn query(&self, pid: u32) -> Result<ThreadStats, Error> {
        let response = self.exchange(pid).await?;
        tracing::debug!(
            pid,
            path = %self.path.display(),
            response = response.trim_end(),
            "thread_info exchange"
        );
        ThreadStats::parse_response(pid, &response)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    // A regular file stands in for the proc entry: the request overwrites the
    // first line and the single read returns whatever follows it.
    fn fake_entry(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn query_reads_response_after_request() {
        let entry = fake_entry("0000\nThreadID:4242 Time:15(ms) context switch times:7\n");
        let channel = ProcFileChannel::new(entry.path());

        let stats = channel.query(4242).await.unwrap();

        assert_eq!(stats.thread_id, 4242);
        assert_eq!(stats.elapsed_ms, 15);
        assert_eq!(stats.context_switches, 7);
    }

    #[tokio::test]
    async fn missing_entry_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let channel = ProcFileChannel::new(dir.path().join("thread_info"));

        let err = channel.query(1).await.unwrap_err();

        assert!(matches!(err, Error::Open { .. }));
        assert!(err.to_string().contains("thread_info"));
    }

    #[tokio::test]
    async fn no_answer_is_connection_closed() {
        let entry = fake_entry("");
        let channel = ProcFileChannel::new(entry.path());

        let err = channel.query(12).await.unwrap_err();

        assert!(matches!(err, Error::ConnectionClosed));
    }

    #[test]
    fn default_points_at_proc() {
        assert_eq!(
            ProcFileChannel::default().path(),
            Path::new(DEFAULT_PROC_FILE)
        );
    }
}
