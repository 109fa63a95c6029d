//! Call-site metadata and line formatting

use std::fmt::{self, Write as _};

use chrono::{DateTime, Local};

/// Timestamp layout of every line
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Where a record was emitted from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location<'a> {
    pub file: &'a str,
    /// Enclosing function or module path
    pub function: &'a str,
    pub line: u32,
}

impl<'a> Location<'a> {
    pub const fn new(file: &'a str, function: &'a str, line: u32) -> Self {
        Self {
            file,
            function,
            line,
        }
    }
}

/// Expand the caller's message
///
/// A `Display` impl that fails mid-way leaves a marker instead of aborting.
pub fn render_message(args: fmt::Arguments<'_>) -> String {
    match args.as_str() {
        Some(s) => s.to_string(),
        None => {
            let mut message = String::new();
            if message.write_fmt(args).is_err() {
                message.push_str("<message formatting failed>");
            }
            message
        }
    }
}

/// Render one record as a newline-terminated line
///
/// Layout: `{timestamp} [{caption}] {file}:{line} {function}() {message}`.
pub fn format_line(
    timestamp: &DateTime<Local>,
    caption: &str,
    location: &Location<'_>,
    message: &str,
) -> String {
    let mut line = String::with_capacity(64 + message.len());
    let _ = write!(
        line,
        "{} [{}] {}:{} {}() {}",
        timestamp.format(TIMESTAMP_FORMAT),
        caption,
        location.file,
        location.line,
        location.function,
        message
    );
    line.push('\n');
    line
}
