//! Log file retention management
//!
//! Handles cleanup of rotated period files based on age.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::error::{LogError, Result};

use super::file_target::LOG_EXTENSION;
use super::period::PeriodKey;
use super::INTERNAL_TARGET;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Clean up rotated `{prefix}-{period}.log` files older than `retention_days`
///
/// Returns the number of files deleted.
pub fn cleanup_old_logs(logs_dir: &Path, prefix: &str, retention_days: u64) -> Result<usize> {
    cleanup_old_logs_except(logs_dir, prefix, retention_days, None)
}

/// Like [`cleanup_old_logs`], but never removes the file at `keep`
///
/// The non-rotating `{prefix}.log` and files of other prefixes are never
/// removed either.
pub fn cleanup_old_logs_except(
    logs_dir: &Path,
    prefix: &str,
    retention_days: u64,
    keep: Option<&Path>,
) -> Result<usize> {
    if !logs_dir.exists() {
        return Ok(0);
    }

    // A window longer than the clock can express keeps everything
    let Some(retention_secs) = retention_days.checked_mul(SECS_PER_DAY) else {
        return Ok(0);
    };
    let Some(cutoff) = SystemTime::now().checked_sub(Duration::from_secs(retention_secs)) else {
        return Ok(0);
    };

    let rotated_prefix = format!("{}-", prefix);
    let suffix = format!(".{}", LOG_EXTENSION);
    let mut deleted_count = 0;

    let entries = fs::read_dir(logs_dir)
        .map_err(|e| LogError::io("Failed to read log directory", logs_dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| LogError::io("Failed to read log directory", logs_dir, e))?;
        let path = entry.path();

        // Only this logger's rotated files
        let period = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(&rotated_prefix))
            .and_then(|n| n.strip_suffix(&suffix))
            .and_then(PeriodKey::parse);
        if period.is_none() {
            continue;
        }
        if keep == Some(path.as_path()) {
            continue;
        }

        if let Ok(metadata) = entry.metadata() {
            if !metadata.is_file() {
                continue;
            }
            if let Ok(modified) = metadata.modified() {
                if modified < cutoff && fs::remove_file(&path).is_ok() {
                    tracing::debug!(target: INTERNAL_TARGET, path = %path.display(), "removed expired log file");
                    deleted_count += 1;
                }
            }
        }
    }

    Ok(deleted_count)
}
