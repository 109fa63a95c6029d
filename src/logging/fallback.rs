//! Standard error sink and once-only fault reporting

use std::io::{self, Write};

use chrono::Local;

use crate::error::LogError;

use super::record::TIMESTAMP_FORMAT;
use super::INTERNAL_TARGET;

/// Write raw bytes to standard error, unbuffered
pub(crate) fn write_stderr(bytes: &[u8]) -> io::Result<()> {
    let stderr = io::stderr();
    let mut handle = stderr.lock();
    handle.write_all(bytes)?;
    handle.flush()
}

/// Operation whose failure is being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    /// Opening the log file of a new period
    Open,
    /// Writing records or buffered bytes to the open file
    Write,
    /// Growing the write buffer
    Memory,
}

/// Reports each kind of sink failure once until that operation succeeds again
#[derive(Debug, Default)]
pub(crate) struct FaultReporter {
    open: bool,
    write: bool,
    memory: bool,
}

impl FaultReporter {
    fn latch(&mut self, fault: Fault) -> &mut bool {
        match fault {
            Fault::Open => &mut self.open,
            Fault::Write => &mut self.write,
            Fault::Memory => &mut self.memory,
        }
    }

    pub(crate) fn report(&mut self, fault: Fault, err: &LogError, action: &str) {
        let latch = self.latch(fault);
        if *latch {
            return;
        }
        *latch = true;

        tracing::warn!(target: INTERNAL_TARGET, error = %err, ?fault, "log sink failure, {}", action);
        let line = format!(
            "{} [ERROR] rotolog: {}; {}\n",
            Local::now().format(TIMESTAMP_FORMAT),
            err,
            action
        );
        let _ = write_stderr(line.as_bytes());
    }

    /// Re-arm after `fault`'s operation succeeded
    pub(crate) fn reset(&mut self, fault: Fault) {
        *self.latch(fault) = false;
    }

    #[cfg(test)]
    pub(crate) fn has_reported(&self, fault: Fault) -> bool {
        match fault {
            Fault::Open => self.open,
            Fault::Write => self.write,
            Fault::Memory => self.memory,
        }
    }
}
