use std::{fs::OpenOptions, io, path::Path};

use thiserror::Error;
use tracing::{subscriber::SetGlobalDefaultError, Level};
use tracing_subscriber::{filter, fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("unable to open log file")]
    LogFile(#[from] io::Error),

    #[error("a global subscriber is already installed")]
    AlreadyInstalled(#[from] SetGlobalDefaultError),
}

/// Console output filtered by `RUST_LOG`, plus everything down to TRACE appended to `log_file`
pub fn init(log_file: &Path) -> Result<(), TelemetryError> {
    let log_file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(log_file)?;

    let subscriber = Registry::default()
        .with(
            fmt::layer()
                .with_ansi(true)
                .with_line_number(true)
                .with_filter(EnvFilter::from_default_env())
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(log_file)
                .with_filter(filter::LevelFilter::from_level(Level::TRACE))
        );

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;

    #[test]
    fn test_init_installs_once() {
        let log_file = env::temp_dir().join(format!("payroll-telemetry-{}.log", std::process::id()));

        init(&log_file).unwrap();
        tracing::info!("telemetry ready");

        assert!(log_file.exists());
        assert!(matches!(init(&log_file), Err(TelemetryError::AlreadyInstalled(_))));
    }
}
