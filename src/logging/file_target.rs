//! A single open log file
//!
//! Files live under `{base_path}/log/`. A non-rotating logger writes to
//! `{prefix}.log`; a rotating one to `{prefix}-{period}.log`.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{LogError, Result};

use super::period::PeriodKey;

/// Name of the directory created under the base path
pub const LOG_SUBDIR: &str = "log";

/// Extension of every log file
pub const LOG_EXTENSION: &str = "log";

/// Directory holding the log files for `base_path`
pub fn log_dir(base_path: &Path) -> PathBuf {
    base_path.join(LOG_SUBDIR)
}

/// Path of the file for `period` inside `dir`
pub fn log_file_path(dir: &Path, prefix: &str, period: &PeriodKey) -> PathBuf {
    if period.is_constant() {
        dir.join(format!("{}.{}", prefix, LOG_EXTENSION))
    } else {
        dir.join(format!("{}-{}.{}", prefix, period, LOG_EXTENSION))
    }
}

/// An append-mode log file opened for one period
#[derive(Debug)]
pub struct FileTarget {
    path: PathBuf,
    file: File,
    period: PeriodKey,
}

impl FileTarget {
    /// Open (creating if needed) the file for `period`
    pub fn open(dir: &Path, prefix: &str, period: PeriodKey) -> Result<Self> {
        fs::create_dir_all(dir)
            .map_err(|e| LogError::io("Failed to create log directory", dir, e))?;

        let path = log_file_path(dir, prefix, &period);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| LogError::io("Failed to open log file", &path, e))?;

        Ok(Self { path, file, period })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Period this file was opened for
    pub fn period(&self) -> &PeriodKey {
        &self.period
    }

    /// Write `bytes` in one call; an empty slice performs no write
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.file
            .write_all(bytes)
            .map_err(|e| LogError::io("Failed to write log file", &self.path, e))
    }

    /// Push written data down to stable storage
    pub fn sync(&mut self) -> Result<()> {
        self.file
            .flush()
            .and_then(|_| self.file.sync_data())
            .map_err(|e| LogError::io("Failed to sync log file", &self.path, e))
    }
}
