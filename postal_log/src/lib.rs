use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry};

/// File name prefix of the rolling log.
pub const FILE_PREFIX: &str = "postal.log";

/// Handle for changing the log level of a running process.
pub type LevelHandle = reload::Handle<EnvFilter, Registry>;

/// Initialize structured JSON logging into hourly rolling files under `dir`.
/// Returns a handle that can change the level at runtime.
pub fn init(dir: impl AsRef<Path>, level: Level) -> Result<LevelHandle> {
    let file_appender = RollingFileAppender::new(Rotation::HOURLY, dir, FILE_PREFIX);
    let (filter, handle) = reload::Layer::new(filter_for(level));
    let fmt_layer = fmt::layer()
        .with_writer(file_appender)
        .json()
        .with_current_span(false)
        .with_span_list(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("installing file subscriber")?;
    Ok(handle)
}

/// Human-readable logging on stderr, for command-line use.
pub fn init_console(level: Level) -> Result<LevelHandle> {
    let (filter, handle) = reload::Layer::new(filter_for(level));
    let fmt_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("installing console subscriber")?;
    Ok(handle)
}

/// Swap the active level.
pub fn set_level(handle: &LevelHandle, level: Level) -> Result<()> {
    handle
        .reload(filter_for(level))
        .context("reloading log filter")
}

/// Parse `trace`, `debug`, `info`, `warn` or `error` (any case).
pub fn parse_level(s: &str) -> Result<Level> {
    Level::from_str(s).map_err(|_| anyhow::anyhow!("unknown log level {s:?}"))
}

fn filter_for(level: Level) -> EnvFilter {
    EnvFilter::default().add_directive(level.into())
}
