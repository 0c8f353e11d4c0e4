use chrono::Local;
use eyre::Result;
use fern::Dispatch;
use log::LevelFilter;

/// Level used when `RUST_LOG` is unset or unreadable
pub const DEFAULT_LEVEL: LevelFilter = LevelFilter::Info;

/// Turns a `RUST_LOG` value into a level filter.
///
/// Only a bare level name is understood (`debug`, `warn`, ...); anything
/// else falls back to [`DEFAULT_LEVEL`].
#[must_use]
pub fn parse_level(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|level| level.trim().parse().ok())
        .unwrap_or(DEFAULT_LEVEL)
}

/// Sends log records to stdout as `2025-01-31 12:00:00 [INFO] message`.
///
/// # Errors
///
/// If a global logger is already installed.
pub fn setup_logger() -> Result<()> {
    Dispatch::new()
        .level(parse_level(std::env::var("RUST_LOG").ok().as_deref()))
        // dependencies are noisy at debug
        .level_for("alloy", LevelFilter::Warn)
        .chain(std::io::stdout())
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                message
            ));
        })
        .apply()?;
    Ok(())
}
