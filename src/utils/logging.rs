use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::error::{ProcessingError, Result};

/// Install the process-wide subscriber.
///
/// The console only shows errors unless `verbose` is set (or `RUST_LOG` says
/// otherwise). When `log_file` is given, everything down to DEBUG is appended
/// to it as well.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let console_level = if verbose {
        LevelFilter::INFO
    } else {
        LevelFilter::ERROR
    };
    let console_filter = EnvFilter::builder()
        .with_default_directive(console_level.into())
        .from_env_lossy();
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(LevelFilter::DEBUG),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| ProcessingError::Logging(e.to_string()))
}
