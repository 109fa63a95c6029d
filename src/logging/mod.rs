//! Leveled file logging
//!
//! Provides the [`Logger`] context object, time-based rotation of its output
//! file, optional in-memory write buffering, retention of rotated files and a
//! bridge for `tracing` events.

mod buffer;
mod emitter;
mod fallback;
mod file_target;
mod level;
mod period;
mod record;
mod retention;
mod rotation;
mod tracing_layer;

/// `tracing` target of the logger's own diagnostics
///
/// [`RotologLayer`] drops events with this target so the logger never writes
/// into itself.
pub const INTERNAL_TARGET: &str = "rotolog::internal";

pub use buffer::{WriteBuffer, DEFAULT_BUFFER_CAPACITY};
pub use emitter::Logger;
pub use file_target::{log_dir, log_file_path, FileTarget, LOG_EXTENSION, LOG_SUBDIR};
pub use level::Level;
pub use period::{Clock, ManualClock, PeriodKey, RotateCycle, SystemClock};
pub use record::{format_line, render_message, Location, TIMESTAMP_FORMAT};
pub use retention::{cleanup_old_logs, cleanup_old_logs_except};
pub use rotation::RotationManager;
pub use tracing_layer::{install_tracing, RotologLayer};
