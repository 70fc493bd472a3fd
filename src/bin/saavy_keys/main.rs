//! saavy-keys - play the computer keyboard like a piano
//!
//! Run with: cargo run --bin saavy-keys
//!
//! Logs go to `saavy-keys.log` in the temp directory; set `RUST_LOG` to
//! change the filter.

mod app;
mod ui;

use std::{fs::File, sync::Mutex};

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use saavy_keys::{SynthConfig, Waveform};
use tracing_subscriber::EnvFilter;

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    init_logging()?;

    let config = SynthConfig::new()
        .waveform(Waveform::Triangle)
        .sustain_level(0.6);

    app::run(config)
}

/// The terminal belongs to the TUI, so logs go to a file.
fn init_logging() -> EyreResult<()> {
    let path = std::env::temp_dir().join("saavy-keys.log");
    let file = File::create(&path)
        .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("saavy_keys=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    tracing::info!(log = %path.display(), "saavy-keys starting");
    Ok(())
}
