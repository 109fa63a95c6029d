//! In-memory write buffer
//!
//! Accumulates formatted lines for the open log file and hands them to the
//! file in one write when a flush trigger fires.

use crate::error::{LogError, Result};

use super::file_target::FileTarget;

/// Default size at which a buffered logger flushes on its own
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// Append-only byte buffer in front of a [`FileTarget`]
#[derive(Debug)]
pub struct WriteBuffer {
    bytes: Vec<u8>,
    /// Flush threshold in bytes
    capacity: usize,
    #[cfg(test)]
    refuse_next: bool,
}

impl WriteBuffer {
    /// Create an empty buffer that asks for a flush past `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: Vec::new(),
            capacity: capacity.max(1),
            #[cfg(test)]
            refuse_next: false,
        }
    }

    /// Append one formatted record
    ///
    /// Returns `true` when the buffer has reached its flush threshold. On
    /// allocation failure nothing is appended and the caller is expected to
    /// write the record directly.
    pub fn append(&mut self, record: &[u8]) -> Result<bool> {
        #[cfg(test)]
        if std::mem::take(&mut self.refuse_next) {
            return Err(LogError::ResourceExhausted(record.len()));
        }
        self.bytes
            .try_reserve(record.len())
            .map_err(|_| LogError::ResourceExhausted(record.len()))?;
        self.bytes.extend_from_slice(record);
        Ok(self.is_full())
    }

    /// Write all pending bytes to `target` in one batch
    ///
    /// The buffer is emptied only once the write has succeeded. Returns the
    /// number of bytes written; an empty buffer performs no write.
    pub fn drain_into(&mut self, target: &mut FileTarget) -> Result<usize> {
        if self.bytes.is_empty() {
            return Ok(0);
        }
        target.write_all(&self.bytes)?;
        let written = self.bytes.len();
        self.bytes.clear();
        Ok(written)
    }

    /// Remove and return all pending bytes
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the flush threshold; takes effect on the next append
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
    }

    /// Make the next append fail as if allocation had failed
    #[cfg(test)]
    pub(crate) fn refuse_next_append(&mut self) {
        self.refuse_next = true;
    }

    fn is_full(&self) -> bool {
        self.bytes.len() >= self.capacity
    }
}

impl Default for WriteBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}
