//! rotolog - leveled logging with time-based file rotation
//!
//! A [`Logger`] writes timestamped, leveled lines to standard error or to
//! `{base_path}/log/{prefix}*.log`, rolling to a new file every day, hour or
//! minute, optionally batching writes in memory.
//!
//! Loggers can be used as plain values, or installed once per process with
//! [`init`] and driven through the free functions and the `log_*!` macros:
//!
//! ```no_run
//! rotolog::init().unwrap();
//! rotolog::set_prefix("/tmp/app", "svc").unwrap();
//! rotolog::set_rotate_cycle("H").unwrap();
//!
//! rotolog::log_info!("listening on port {}", 8080);
//! rotolog::log_error!("lost connection to {}", "db-1");
//!
//! rotolog::destroy();
//! ```

pub mod config;
pub mod error;
pub mod logging;

use std::fmt;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub use config::LoggerConfig;
pub use error::{status, LogError, Result};
pub use logging::{Level, Location, Logger, RotateCycle};

static GLOBAL: RwLock<Option<Arc<Logger>>> = RwLock::new(None);

fn read_global() -> RwLockReadGuard<'static, Option<Arc<Logger>>> {
    GLOBAL.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_global() -> RwLockWriteGuard<'static, Option<Arc<Logger>>> {
    GLOBAL.write().unwrap_or_else(PoisonError::into_inner)
}

/// Install a default process-wide logger (INFO, stderr, daily rotation, unbuffered)
///
/// Fails with [`LogError::InvalidState`] if one is already installed.
pub fn init() -> Result<()> {
    install(Logger::new())
}

/// Install a process-wide logger built from `config`
pub fn init_with_config(config: &LoggerConfig) -> Result<()> {
    install(Logger::with_config(config)?)
}

/// Install `logger` as the process-wide logger
pub fn install(logger: Logger) -> Result<()> {
    let mut global = write_global();
    if global.is_some() {
        return Err(LogError::InvalidState("logger is already initialized".into()));
    }
    *global = Some(Arc::new(logger));
    Ok(())
}

/// Flush and close the process-wide logger and uninstall it
///
/// Safe to call when nothing is installed. Must not race with emission.
pub fn destroy() {
    let taken = write_global().take();
    if let Some(logger) = taken {
        if let Err(e) = logger.shutdown() {
            tracing::warn!(target: logging::INTERNAL_TARGET, error = %e, "failed to flush logger on destroy");
        }
    }
}

/// The process-wide logger, if installed
pub fn logger() -> Option<Arc<Logger>> {
    read_global().clone()
}

fn with_logger<T>(f: impl FnOnce(&Logger) -> Result<T>) -> Result<T> {
    // Clone out so the global lock is not held while writing
    match logger() {
        Some(logger) => f(&logger),
        None => Err(LogError::InvalidState("logger is not initialized".into())),
    }
}

/// See [`Logger::set_level`]
pub fn set_level(name: &str) -> Result<()> {
    with_logger(|l| l.set_level(name))
}

/// See [`Logger::set_prefix`]
pub fn set_prefix(base_path: impl AsRef<Path>, filename_prefix: &str) -> Result<()> {
    with_logger(|l| l.set_prefix(base_path, filename_prefix))
}

/// See [`Logger::set_rotate_cycle`]
pub fn set_rotate_cycle(name: &str) -> Result<()> {
    with_logger(|l| l.set_rotate_cycle(name))
}

/// See [`Logger::set_cache`]
pub fn set_cache(enabled: bool) -> Result<()> {
    with_logger(|l| l.set_cache(enabled))
}

/// See [`Logger::force_sync`]
pub fn force_sync() -> Result<()> {
    with_logger(|l| l.force_sync())
}

/// Whether the process-wide logger would write a record at `level`
pub fn enabled(level: Level) -> bool {
    read_global().as_ref().is_some_and(|l| l.enabled(level))
}

/// Emit through the process-wide logger; see [`Logger::emit`]
pub fn emit(
    level: Level,
    caption: &str,
    need_sync: bool,
    location: Location<'_>,
    args: fmt::Arguments<'_>,
) -> Result<()> {
    with_logger(|l| l.emit(level, caption, need_sync, location, args))
}

#[doc(hidden)]
#[macro_export]
macro_rules! __rotolog_log {
    (logger: $logger:expr, $level:expr, $($arg:tt)+) => {{
        let level: $crate::Level = $level;
        let logger: &$crate::Logger = &$logger;
        if logger.enabled(level) {
            let _ = logger.log(
                level,
                $crate::Location::new(file!(), module_path!(), line!()),
                format_args!($($arg)+),
            );
        }
    }};
    ($level:expr, $($arg:tt)+) => {{
        let level: $crate::Level = $level;
        if $crate::enabled(level) {
            let _ = $crate::emit(
                level,
                level.caption(),
                level.needs_sync(),
                $crate::Location::new(file!(), module_path!(), line!()),
                format_args!($($arg)+),
            );
        }
    }};
}

/// Log at ERROR, flushing immediately
///
/// Writes through the process-wide logger, or through `logger: expr` when given.
#[macro_export]
macro_rules! log_error {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::__rotolog_log!(logger: $logger, $crate::Level::Error, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__rotolog_log!($crate::Level::Error, $($arg)+)
    };
}

/// Log at WARNING, flushing immediately
#[macro_export]
macro_rules! log_warning {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::__rotolog_log!(logger: $logger, $crate::Level::Warning, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__rotolog_log!($crate::Level::Warning, $($arg)+)
    };
}

/// Log at INFO; buffered when caching is on
#[macro_export]
macro_rules! log_info {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::__rotolog_log!(logger: $logger, $crate::Level::Info, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__rotolog_log!($crate::Level::Info, $($arg)+)
    };
}

/// Log at DEBUG, flushing immediately
#[macro_export]
macro_rules! log_debug {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::__rotolog_log!(logger: $logger, $crate::Level::Debug, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__rotolog_log!($crate::Level::Debug, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::TempDir;

    struct CountingDisplay<'a>(&'a Cell<usize>);

    impl fmt::Display for CountingDisplay<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            self.0.set(self.0.get() + 1);
            f.write_str("counted")
        }
    }

    #[test]
    fn test_macros_with_explicit_logger() {
        let temp_dir = TempDir::new().unwrap();
        let logger = Logger::new();
        logger.set_prefix(temp_dir.path(), "macro").unwrap();
        logger.set_rotate_cycle("NONE").unwrap();

        log_error!(logger: logger, "e {}", 1);
        log_warning!(logger: logger, "w {}", 2);
        log_info!(logger: logger, "i {}", 3);
        log_debug!(logger: logger, "d {}", 4);

        let content = std::fs::read_to_string(temp_dir.path().join("log/macro.log")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("[ERROR]") && lines[0].ends_with("e 1"));
        assert!(lines[1].contains("[WARNING]") && lines[1].ends_with("w 2"));
        assert!(lines[2].contains("[INFO]") && lines[2].ends_with("i 3"));
        assert!(lines[0].contains(file!()));
        assert!(lines[0].contains(module_path!()));
    }

    #[test]
    fn test_filtered_macro_skips_formatting() {
        let logger = Logger::new();
        logger.set_level("ERROR").unwrap();
        let calls = Cell::new(0);

        log_info!(logger: logger, "{}", CountingDisplay(&calls));
        log_debug!(logger: logger, "{}", CountingDisplay(&calls));
        assert_eq!(calls.get(), 0);
    }
}
