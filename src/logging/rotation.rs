//! Time-based rotation of the log file
//!
//! The manager is either closed or holds one [`FileTarget`] opened for a
//! period. Each record asks for the target of its period; when the period has
//! moved on, pending buffered bytes go to the old file before the new one is
//! opened, so a buffered record always lands in the file of the period it was
//! generated in.

use std::path::{Path, PathBuf};

use crate::error::Result;

use super::buffer::WriteBuffer;
use super::fallback::{write_stderr, Fault, FaultReporter};
use super::file_target::{log_dir, FileTarget};
use super::period::PeriodKey;
use super::INTERNAL_TARGET;

#[derive(Debug)]
enum TargetState {
    Closed,
    Open(FileTarget),
}

/// Owns the open log file and swaps it at period boundaries
#[derive(Debug)]
pub struct RotationManager {
    dir: PathBuf,
    prefix: String,
    state: TargetState,
    has_opened: bool,
}

impl RotationManager {
    /// Manager writing under `{base_path}/log/{prefix}*.log`; opens nothing yet
    pub fn new(base_path: &Path, prefix: impl Into<String>) -> Self {
        Self {
            dir: log_dir(base_path),
            prefix: prefix.into(),
            state: TargetState::Closed,
            has_opened: false,
        }
    }

    /// Directory the log files are written to
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether any file has ever been opened by this manager
    pub fn has_opened(&self) -> bool {
        self.has_opened
    }

    /// Path of the currently open file
    pub fn current_path(&self) -> Option<&Path> {
        match &self.state {
            TargetState::Open(target) => Some(target.path()),
            TargetState::Closed => None,
        }
    }

    /// Period of the currently open file
    pub fn current_period(&self) -> Option<&PeriodKey> {
        match &self.state {
            TargetState::Open(target) => Some(target.period()),
            TargetState::Closed => None,
        }
    }

    /// Return the file for `desired`, rotating first if needed
    ///
    /// If the new file cannot be opened the previous target is kept; with no
    /// previous target `None` is returned and the caller falls back to stderr.
    pub(crate) fn ensure(
        &mut self,
        desired: PeriodKey,
        buffer: &mut WriteBuffer,
        faults: &mut FaultReporter,
    ) -> Option<&mut FileTarget> {
        let current = matches!(&self.state, TargetState::Open(t) if *t.period() == desired);
        if !current {
            self.rotate(desired, buffer, faults);
        }

        match &mut self.state {
            TargetState::Open(target) => Some(target),
            TargetState::Closed => None,
        }
    }

    fn rotate(&mut self, desired: PeriodKey, buffer: &mut WriteBuffer, faults: &mut FaultReporter) {
        if let TargetState::Open(old) = &mut self.state {
            flush_or_spill(buffer, old, faults);
        }

        match FileTarget::open(&self.dir, &self.prefix, desired) {
            Ok(next) => {
                tracing::debug!(target: INTERNAL_TARGET, path = %next.path().display(), "opened log file");
                if let TargetState::Open(old) = std::mem::replace(&mut self.state, TargetState::Open(next)) {
                    tracing::debug!(target: INTERNAL_TARGET, path = %old.path().display(), "closed log file");
                }
                self.has_opened = true;
                faults.reset(Fault::Open);
            }
            Err(e) => {
                let action = match &self.state {
                    TargetState::Open(_) => "keeping the previous log file",
                    TargetState::Closed => "writing to stderr",
                };
                faults.report(Fault::Open, &e, action);
            }
        }
    }

    /// Drain the buffer into the open file without syncing
    pub(crate) fn flush(&mut self, buffer: &mut WriteBuffer) -> Result<()> {
        match &mut self.state {
            TargetState::Open(target) => buffer.drain_into(target).map(|_| ()),
            TargetState::Closed => Ok(()),
        }
    }

    /// Drain the buffer into the open file and sync it to stable storage
    pub(crate) fn sync(&mut self, buffer: &mut WriteBuffer) -> Result<()> {
        match &mut self.state {
            TargetState::Open(target) => {
                buffer.drain_into(target)?;
                target.sync()
            }
            TargetState::Closed => Ok(()),
        }
    }

    /// Flush, sync and close the open file
    ///
    /// The manager is closed afterwards even if the final sync failed.
    pub(crate) fn close(&mut self, buffer: &mut WriteBuffer) -> Result<()> {
        let result = self.sync(buffer);
        if let TargetState::Open(old) = std::mem::replace(&mut self.state, TargetState::Closed) {
            tracing::debug!(target: INTERNAL_TARGET, path = %old.path().display(), "closed log file");
        }
        result
    }
}

/// Drain `buffer` into `target`, or onto stderr if the file write fails
pub(crate) fn flush_or_spill(
    buffer: &mut WriteBuffer,
    target: &mut FileTarget,
    faults: &mut FaultReporter,
) {
    match buffer.drain_into(target) {
        Ok(0) => {}
        Ok(_) => faults.reset(Fault::Write),
        Err(e) => {
            faults.report(Fault::Write, &e, "writing buffered records to stderr");
            let _ = write_stderr(&buffer.take());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::period::RotateCycle;
    use chrono::{DateTime, Local, TimeZone};
    use std::fs;
    use tempfile::TempDir;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, h, m, 0).single().unwrap()
    }

    #[test]
    fn test_starts_closed_and_opens_lazily() {
        let temp_dir = TempDir::new().unwrap();
        let manager = RotationManager::new(temp_dir.path(), "svc");
        assert!(!manager.has_opened());
        assert!(manager.current_path().is_none());
        assert!(!manager.dir().exists());
    }

    #[test]
    fn test_same_period_reuses_target() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = RotationManager::new(temp_dir.path(), "svc");
        let mut buffer = WriteBuffer::default();
        let mut faults = FaultReporter::default();

        let key = RotateCycle::Hour.period_key(&at(9, 0));
        manager.ensure(key.clone(), &mut buffer, &mut faults).unwrap();
        let first = manager.current_path().unwrap().to_path_buf();

        let same = RotateCycle::Hour.period_key(&at(9, 59));
        manager.ensure(same, &mut buffer, &mut faults).unwrap();
        assert_eq!(manager.current_path().unwrap(), first);
        assert_eq!(manager.current_period(), Some(&key));
    }

    #[test]
    fn test_rotation_flushes_old_buffer_into_old_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = RotationManager::new(temp_dir.path(), "svc");
        let mut buffer = WriteBuffer::default();
        let mut faults = FaultReporter::default();

        manager
            .ensure(RotateCycle::Minute.period_key(&at(9, 0)), &mut buffer, &mut faults)
            .unwrap();
        buffer.append(b"old period\n").unwrap();

        manager
            .ensure(RotateCycle::Minute.period_key(&at(9, 1)), &mut buffer, &mut faults)
            .unwrap();
        assert!(buffer.is_empty());

        let old = manager.dir().join("svc-2024-05-01-09-00.log");
        let new = manager.dir().join("svc-2024-05-01-09-01.log");
        assert_eq!(fs::read_to_string(old).unwrap(), "old period\n");
        assert_eq!(fs::read_to_string(new).unwrap(), "");
        assert_eq!(manager.current_path().unwrap(), manager.dir().join("svc-2024-05-01-09-01.log"));
    }

    #[test]
    fn test_open_failure_without_previous_target_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        // A plain file where the log directory should go
        fs::write(temp_dir.path().join("log"), "blocker").unwrap();

        let mut manager = RotationManager::new(temp_dir.path(), "svc");
        let mut buffer = WriteBuffer::default();
        let mut faults = FaultReporter::default();

        let key = RotateCycle::Day.period_key(&at(9, 0));
        assert!(manager.ensure(key, &mut buffer, &mut faults).is_none());
        assert!(!manager.has_opened());
        assert!(faults.has_reported(Fault::Open));
    }

    #[test]
    fn test_open_failure_keeps_previous_target() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = RotationManager::new(temp_dir.path(), "svc");
        let mut buffer = WriteBuffer::default();
        let mut faults = FaultReporter::default();

        manager
            .ensure(RotateCycle::Minute.period_key(&at(9, 0)), &mut buffer, &mut faults)
            .unwrap();
        let first = manager.current_path().unwrap().to_path_buf();

        // Occupy the next period's file name with a directory
        fs::create_dir(manager.dir().join("svc-2024-05-01-09-01.log")).unwrap();

        let target = manager
            .ensure(RotateCycle::Minute.period_key(&at(9, 1)), &mut buffer, &mut faults)
            .unwrap();
        assert_eq!(target.path(), first);
        assert!(faults.has_reported(Fault::Open));
    }

    #[test]
    fn test_close_drains_buffer() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = RotationManager::new(temp_dir.path(), "svc");
        let mut buffer = WriteBuffer::default();
        let mut faults = FaultReporter::default();

        manager
            .ensure(RotateCycle::None.period_key(&at(9, 0)), &mut buffer, &mut faults)
            .unwrap();
        buffer.append(b"pending\n").unwrap();
        manager.close(&mut buffer).unwrap();

        assert!(manager.current_path().is_none());
        assert!(manager.has_opened());
        let content = fs::read_to_string(manager.dir().join("svc.log")).unwrap();
        assert_eq!(content, "pending\n");
    }

    #[test]
    fn test_successful_drain_rearms_write_faults() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = RotationManager::new(temp_dir.path(), "svc");
        let mut buffer = WriteBuffer::default();
        let mut faults = FaultReporter::default();
        let err = crate::error::LogError::InvalidState("disk full".into());

        let target = manager
            .ensure(RotateCycle::None.period_key(&at(9, 0)), &mut buffer, &mut faults)
            .unwrap();
        faults.report(Fault::Write, &err, "writing to stderr");

        // Nothing pending: no write happened, still latched
        flush_or_spill(&mut buffer, target, &mut faults);
        assert!(faults.has_reported(Fault::Write));

        buffer.append(b"recovered\n").unwrap();
        flush_or_spill(&mut buffer, target, &mut faults);
        assert!(!faults.has_reported(Fault::Write));
        assert!(buffer.is_empty());
    }
}
