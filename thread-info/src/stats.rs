//! Statistics record returned by the provider.

use std::fmt;
use std::str::FromStr;

use crate::Error;

const THREAD_ID_TAG: &str = "ThreadID:";
const TIME_TAG: &str = "Time:";
const TIME_UNIT: &str = "(ms)";
const SWITCHES_TAG: &str = "context switch times:";

/// Execution statistics of one process, as reported by `thread_info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadStats {
    pub thread_id: u32,
    /// Accumulated user-mode execution time.
    pub elapsed_ms: u64,
    /// Voluntary plus involuntary context switches.
    pub context_switches: u64,
}

impl ThreadStats {
    /// Interprets the provider's answer to a query for `pid`.
    ///
    /// The provider echoes the request when it has no such process, which is
    /// reported as [`Error::UnknownProcess`].
    pub fn parse_response(pid: u32, response: &str) -> Result<Self, Error> {
        let line = response.trim_end_matches(['\0', '\n', '\r', ' ']);
        if line.is_empty() {
            return Err(Error::ConnectionClosed);
        }
        if line.trim() == pid.to_string() {
            return Err(Error::UnknownProcess(pid));
        }
        line.parse()
    }
}

impl fmt::Display for ThreadStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} {}{}{} {}{}",
            THREAD_ID_TAG,
            self.thread_id,
            TIME_TAG,
            self.elapsed_ms,
            TIME_UNIT,
            SWITCHES_TAG,
            self.context_switches
        )
    }
}

impl FromStr for ThreadStats {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || Error::Malformed(s.to_string());

        let rest = s.trim().strip_prefix(THREAD_ID_TAG).ok_or_else(malformed)?;
        let (thread_id, rest) = rest.split_once(' ').ok_or_else(malformed)?;
        let rest = rest.trim_start().strip_prefix(TIME_TAG).ok_or_else(malformed)?;
        let (elapsed_ms, rest) = rest.split_once(TIME_UNIT).ok_or_else(malformed)?;
        let switches = rest
            .trim_start()
            .strip_prefix(SWITCHES_TAG)
            .ok_or_else(malformed)?;

        Ok(Self {
            thread_id: thread_id.parse().map_err(|_| malformed())?,
            elapsed_ms: elapsed_ms.parse().map_err(|_| malformed())?,
            context_switches: switches.trim().parse().map_err(|_| malformed())?,
        })
    }
}
