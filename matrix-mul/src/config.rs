//! Run configuration from the command line and environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thread_info::DEFAULT_PROC_FILE;

use crate::Error;
use crate::coordinator::DEFAULT_LOCK_PAUSE;

pub const DEFAULT_OUTPUT: &str = "result.txt";

pub const ENV_OUTPUT: &str = "MATRIX_MUL_OUTPUT";
pub const ENV_PROC_FILE: &str = "MATRIX_MUL_PROC_FILE";
pub const ENV_BACKEND: &str = "MATRIX_MUL_BACKEND";
pub const ENV_LOCK_PAUSE_MS: &str = "MATRIX_MUL_LOCK_PAUSE_MS";

/// How workers compute their rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// One producer process per worker, results over a pipe.
    #[default]
    Piped,
    /// In-process computation, no producer.
    Inline,
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "piped" => Ok(Self::Piped),
            "inline" => Ok(Self::Inline),
            other => Err(Error::Config(format!(
                "unknown backend {:?} (expected piped or inline)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub workers: usize,
    pub matrix_a: PathBuf,
    pub matrix_b: PathBuf,
    pub output: PathBuf,
    pub proc_file: PathBuf,
    pub backend: BackendKind,
    pub lock_pause: Duration,
}

impl Config {
    /// Builds the configuration from `argv` and the process environment.
    pub fn from_env_args(args: &[String]) -> Result<Self, Error> {
        Self::from_args(args, |key| std::env::var(key).ok())
    }

    /// `args` is the full argv (program name first); `env` looks up
    /// overrides.
    pub fn from_args(args: &[String], env: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let [_, workers, matrix_a, matrix_b] = args else {
            return Err(Error::Config(format!(
                "expected 3 arguments, got {}",
                args.len().saturating_sub(1)
            )));
        };

        let workers = workers
            .trim()
            .parse::<usize>()
            .map_err(|e| Error::Config(format!("bad worker count {:?}: {}", workers, e)))?;

        let backend = match env(ENV_BACKEND) {
            Some(value) => value.parse()?,
            None => BackendKind::default(),
        };
        let lock_pause = match env(ENV_LOCK_PAUSE_MS) {
            Some(value) => Duration::from_millis(value.trim().parse().map_err(|e| {
                Error::Config(format!("bad {} {:?}: {}", ENV_LOCK_PAUSE_MS, value, e))
            })?),
            None => DEFAULT_LOCK_PAUSE,
        };

        let config = Self {
            workers,
            matrix_a: PathBuf::from(matrix_a),
            matrix_b: PathBuf::from(matrix_b),
            output: env(ENV_OUTPUT).map_or_else(|| PathBuf::from(DEFAULT_OUTPUT), PathBuf::from),
            proc_file: env(ENV_PROC_FILE)
                .map_or_else(|| PathBuf::from(DEFAULT_PROC_FILE), PathBuf::from),
            backend,
            lock_pause,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks what can be checked before the matrices are loaded.
    pub fn validate(&self) -> Result<(), Error> {
        if self.workers == 0 {
            return Err(Error::Config("worker count must be at least 1".into()));
        }
        Ok(())
    }
}
