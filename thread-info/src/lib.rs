//! Client for the `thread_info` process statistics channel.
//!
//! `thread-info` talks to an external statistics provider (normally the
//! `/proc/thread_info` entry exposed by a kernel module) over a tiny
//! line protocol: the client writes a process id, the provider answers with
//! one line describing that process.
//!
//! # Wire Format
//!
//! - **Request**: `"<pid>\n"`
//! - **Response**: `"ThreadID:<pid> Time:<ms>(ms) context switch times:<n>\n"`
//! - **Unknown pid**: the provider echoes the request back unchanged
//!
//! # Example
//!
//! ```no_run
//! use thread_info::{DiagnosticChannel, ProcFileChannel};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let channel = ProcFileChannel::default();
//!     let stats = channel.query(std::process::id()).await?;
//!     println!("{}", stats);
//!     Ok(())
//! }
//! ```

mod channel;
mod error;
mod stats;
mod stub;

pub use channel::{DEFAULT_PROC_FILE, DiagnosticChannel, ProcFileChannel};
pub use error::Error;
pub use stats::ThreadStats;
pub use stub::StubChannel;
