//! The logger context object
//!
//! A [`Logger`] holds the level threshold, the output location, the rotation
//! cycle and the optional write buffer. One mutex serializes the whole
//! rotate, buffer and write path, so concurrent records never interleave and a
//! rotation is never observed half done.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};

use crate::config::LoggerConfig;
use crate::error::{LogError, Result};

use super::buffer::{WriteBuffer, DEFAULT_BUFFER_CAPACITY};
use super::fallback::{write_stderr, Fault, FaultReporter};
use super::period::{Clock, RotateCycle, SystemClock};
use super::record::{format_line, render_message, Location};
use super::retention;
use super::rotation::{flush_or_spill, RotationManager};
use super::Level;

struct State {
    cycle: RotateCycle,
    cache: bool,
    buffer: WriteBuffer,
    /// `None` until a prefix is configured; records then go to stderr
    rotation: Option<RotationManager>,
    faults: FaultReporter,
}

impl State {
    fn write_record(&mut self, now: &DateTime<Local>, line: &[u8], need_sync: bool) -> Result<()> {
        let State {
            cycle,
            cache,
            buffer,
            rotation,
            faults,
        } = self;

        let Some(rotation) = rotation.as_mut() else {
            return stderr(line);
        };
        let Some(target) = rotation.ensure(cycle.period_key(now), buffer, faults) else {
            return stderr(line);
        };

        if *cache {
            match buffer.append(line) {
                Ok(full) => {
                    faults.reset(Fault::Memory);
                    if need_sync || full {
                        flush_or_spill(buffer, target, faults);
                    }
                    return Ok(());
                }
                Err(e) => {
                    // Keep ordering: earlier buffered records go out first
                    faults.report(Fault::Memory, &e, "writing the record unbuffered");
                    flush_or_spill(buffer, target, faults);
                }
            }
        }

        if let Err(e) = target.write_all(line) {
            faults.report(Fault::Write, &e, "writing to stderr");
            return stderr(line);
        }
        faults.reset(Fault::Write);
        Ok(())
    }
}

fn stderr(line: &[u8]) -> Result<()> {
    write_stderr(line).map_err(|e| LogError::io("Failed to write to stderr", "<stderr>", e))
}

/// Leveled logger with optional time-based rotation and write buffering
pub struct Logger {
    /// Syslog priority of the threshold level
    threshold: AtomicU8,
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
}

impl Logger {
    /// Logger with defaults: INFO, stderr output, daily rotation, no buffering
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Like [`Logger::new`] but reading time from `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            threshold: AtomicU8::new(Level::default().priority()),
            clock,
            state: Mutex::new(State {
                cycle: RotateCycle::default(),
                cache: false,
                buffer: WriteBuffer::new(DEFAULT_BUFFER_CAPACITY),
                rotation: None,
                faults: FaultReporter::default(),
            }),
        }
    }

    /// Build a logger and apply `config` to it
    pub fn with_config(config: &LoggerConfig) -> Result<Self> {
        let logger = Self::new();
        logger.apply_config(config)?;
        Ok(logger)
    }

    /// Apply every setting in `config`, validating like the individual setters
    pub fn apply_config(&self, config: &LoggerConfig) -> Result<()> {
        self.set_level(&config.level)?;
        self.set_rotate_cycle(&config.rotate_cycle)?;
        self.set_buffer_capacity(config.buffer_capacity);
        if let Some(location) = config.location() {
            let (base_path, prefix) = location?;
            self.set_prefix(base_path, &prefix)?;
        }
        self.set_cache(config.cache)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current threshold level
    pub fn level(&self) -> Level {
        Level::from_priority(self.threshold.load(Ordering::Relaxed)).unwrap_or_default()
    }

    /// Whether a record at `level` would be written
    pub fn enabled(&self, level: Level) -> bool {
        level.priority() <= self.threshold.load(Ordering::Relaxed)
    }

    /// Set the threshold from a level name (ERROR, WARN/WARNING, INFO, DEBUG)
    pub fn set_level(&self, name: &str) -> Result<()> {
        let level: Level = name.parse()?;
        self.set_threshold(level);
        Ok(())
    }

    /// Set the threshold directly
    pub fn set_threshold(&self, level: Level) {
        self.threshold.store(level.priority(), Ordering::Relaxed);
    }

    /// Direct output to `{base_path}/log/{prefix}*.log`
    ///
    /// Only allowed before the first log file has been opened.
    pub fn set_prefix(&self, base_path: impl AsRef<Path>, prefix: &str) -> Result<()> {
        let base_path = base_path.as_ref();
        if base_path.as_os_str().is_empty() {
            return Err(LogError::InvalidArgument("base path is empty".into()));
        }
        if prefix.is_empty() || prefix.contains(['/', '\\']) {
            return Err(LogError::InvalidArgument(format!(
                "invalid file name prefix '{}'",
                prefix
            )));
        }

        let mut state = self.lock();
        if state.rotation.as_ref().is_some_and(|r| r.has_opened()) {
            return Err(LogError::InvalidState(
                "log path cannot change after the log file has been opened".into(),
            ));
        }
        state.rotation = Some(RotationManager::new(base_path, prefix));
        Ok(())
    }

    /// Set the rotation cycle from its name (D, H, M, NONE)
    ///
    /// The open file keeps its name; the next record moves to the file of the
    /// new cycle's period.
    pub fn set_rotate_cycle(&self, name: &str) -> Result<()> {
        let cycle: RotateCycle = name.parse()?;
        self.lock().cycle = cycle;
        Ok(())
    }

    pub fn rotate_cycle(&self) -> RotateCycle {
        self.lock().cycle
    }

    /// Turn write buffering on or off
    ///
    /// Turning it off first flushes pending bytes; if that flush fails,
    /// buffering stays on and the error is returned.
    pub fn set_cache(&self, enabled: bool) -> Result<()> {
        let mut state = self.lock();
        if !enabled && state.cache {
            let State {
                buffer, rotation, ..
            } = &mut *state;
            if let Some(rotation) = rotation.as_mut() {
                rotation.flush(buffer)?;
            }
        }
        state.cache = enabled;
        Ok(())
    }

    pub fn is_cached(&self) -> bool {
        self.lock().cache
    }

    /// Buffer size that triggers a flush on its own
    pub fn set_buffer_capacity(&self, bytes: usize) {
        self.lock().buffer.set_capacity(bytes);
    }

    /// Number of bytes waiting in the write buffer
    pub fn pending_bytes(&self) -> usize {
        self.lock().buffer.len()
    }

    /// Path of the currently open log file, if any
    pub fn current_path(&self) -> Option<PathBuf> {
        let state = self.lock();
        state
            .rotation
            .as_ref()
            .and_then(|r| r.current_path())
            .map(Path::to_path_buf)
    }

    /// Drain the write buffer and sync the log file to stable storage
    ///
    /// The buffer is only cleared once its bytes were written.
    pub fn force_sync(&self) -> Result<()> {
        let mut state = self.lock();
        let State {
            buffer, rotation, ..
        } = &mut *state;
        match rotation.as_mut() {
            Some(rotation) => rotation.sync(buffer),
            None => stderr(&[]),
        }
    }

    /// Emit one record
    ///
    /// Nothing is formatted when `level` is filtered out. I/O failures fall
    /// back to the previous file or stderr; an error is returned only when no
    /// sink accepted the record.
    pub fn emit(
        &self,
        level: Level,
        caption: &str,
        need_sync: bool,
        location: Location<'_>,
        args: fmt::Arguments<'_>,
    ) -> Result<()> {
        if !self.enabled(level) {
            return Ok(());
        }

        // Rendered outside the lock: a Display impl may itself log
        let message = render_message(args);

        let mut state = self.lock();
        let now = self.clock.now();
        let line = format_line(&now, caption, &location, &message);
        state.write_record(&now, line.as_bytes(), need_sync)
    }

    /// Emit with the caption and sync policy of `level`
    pub fn log(&self, level: Level, location: Location<'_>, args: fmt::Arguments<'_>) -> Result<()> {
        self.emit(level, level.caption(), level.needs_sync(), location, args)
    }

    /// Delete rotated files of this logger older than `retention_days`
    ///
    /// Returns the number of files deleted; `0` when no path is configured.
    pub fn prune_old_logs(&self, retention_days: u64) -> Result<usize> {
        let (dir, prefix, current) = {
            let state = self.lock();
            match state.rotation.as_ref() {
                Some(r) => (
                    r.dir().to_path_buf(),
                    r.prefix().to_string(),
                    r.current_path().map(Path::to_path_buf),
                ),
                None => return Ok(0),
            }
        };
        retention::cleanup_old_logs_except(&dir, &prefix, retention_days, current.as_deref())
    }

    /// Flush, sync and close the log file
    ///
    /// A later record reopens the file for its period.
    pub fn shutdown(&self) -> Result<()> {
        let mut state = self.lock();
        let State {
            buffer, rotation, ..
        } = &mut *state;
        match rotation.as_mut() {
            Some(rotation) => rotation.close(buffer),
            None => Ok(()),
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level())
            .field("current_path", &self.current_path())
            .finish_non_exhaustive()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(rotation) = state.rotation.as_mut() {
            if let Err(e) = rotation.close(&mut state.buffer) {
                state.faults.report(Fault::Write, &e, "dropping unflushed records");
            }
        }
    }
}
