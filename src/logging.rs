use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::domain::{RVConfig, RVError};

pub const LOG_ENV: &str = "RV_LOG";

/// Log to a file, the terminal belongs to the ui.
pub fn init_logging(config: &RVConfig) -> Result<(), RVError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true),
        )
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| RVError::LoadingFailed(format!("Logging already initialised: {e}")))
}
