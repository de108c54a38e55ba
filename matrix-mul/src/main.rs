use std::env;
use std::sync::Arc;

use matrix_mul::producer::{self, PRODUCE_FLAG};
use matrix_mul::{Config, Error, Matrix, MatrixMul};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: matrix-mul [number of worker threads] [file name of input matrix1] [file name of input matrix2]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let args: Vec<String> = env::args().collect();

    if args.get(1).map(String::as_str) == Some(PRODUCE_FLAG) {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        producer::run(stdin.lock(), stdout.lock())?;
        return Ok(());
    }

    if args.len() != 4 {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = match Config::from_env_args(&args) {
        Ok(config) => config,
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };

    let (a, b) = match (
        Matrix::load(&config.matrix_a).await,
        Matrix::load(&config.matrix_b).await,
    ) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => {
            println!("{}", e);
            return Ok(());
        }
    };

    let mm = MatrixMul::from_config(&config)?;
    match mm.run(Arc::new(a), Arc::new(b), &config.output).await {
        Ok(report) => {
            println!("\nElapsed Time: {} (s)", report.stats.elapsed_seconds());
        }
        Err(Error::DimensionMismatch(..)) => {
            println!("Cannot do matrix multiplication.");
        }
        Err(e @ Error::Write { .. }) => return Err(e.into()),
        Err(e) => {
            println!("{}", e);
        }
    }

    Ok(())
}

/// Logs go to stderr: in producer mode stdout carries frames.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
