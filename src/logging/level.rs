//! Severity levels
//!
//! Levels carry their syslog priority. A lower priority is more severe, so a
//! record passes the filter when its priority is at or below the threshold's.

use std::fmt;
use std::str::FromStr;

use crate::error::LogError;

/// Severity of a log record, and the verbosity threshold of a logger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Level {
    Error,
    Warning,
    #[default]
    Info,
    Debug,
}

impl Level {
    /// Syslog priority (`LOG_ERR`, `LOG_WARNING`, `LOG_INFO`, `LOG_DEBUG`)
    pub const fn priority(self) -> u8 {
        match self {
            Level::Error => 3,
            Level::Warning => 4,
            Level::Info => 6,
            Level::Debug => 7,
        }
    }

    /// Inverse of [`Level::priority`]
    pub const fn from_priority(priority: u8) -> Option<Self> {
        match priority {
            3 => Some(Level::Error),
            4 => Some(Level::Warning),
            6 => Some(Level::Info),
            7 => Some(Level::Debug),
            _ => None,
        }
    }

    /// Caption written into each formatted line
    pub const fn caption(self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warning => "WARNING",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
        }
    }

    /// Whether records of this level force a flush right after being written
    ///
    /// INFO is the high-volume level and is the only one allowed to linger in
    /// the write buffer.
    pub const fn needs_sync(self) -> bool {
        !matches!(self, Level::Info)
    }

    /// Whether a record at `record` passes a logger configured at `self`
    pub const fn permits(self, record: Level) -> bool {
        record.priority() <= self.priority()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.caption())
    }
}

impl FromStr for Level {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ERR" | "ERROR" => Ok(Level::Error),
            "WARN" | "WARNING" => Ok(Level::Warning),
            "INFO" => Ok(Level::Info),
            "DEBUG" => Ok(Level::Debug),
            _ => Err(LogError::InvalidArgument(format!("unknown log level '{}'", s))),
        }
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => Level::Error,
            tracing::Level::WARN => Level::Warning,
            tracing::Level::INFO => Level::Info,
            tracing::Level::DEBUG | tracing::Level::TRACE => Level::Debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("error".parse::<Level>().unwrap(), Level::Error);
        assert_eq!("Err".parse::<Level>().unwrap(), Level::Error);
        assert_eq!("WARN".parse::<Level>().unwrap(), Level::Warning);
        assert_eq!("warning".parse::<Level>().unwrap(), Level::Warning);
        assert_eq!(" Info ".parse::<Level>().unwrap(), Level::Info);
        assert_eq!("dEbUg".parse::<Level>().unwrap(), Level::Debug);
    }

    #[test]
    fn test_parse_rejects_unknown_names() {
        for name in ["", "trace", "notice", "crit", "INFOO"] {
            let err = name.parse::<Level>().unwrap_err();
            assert!(matches!(err, LogError::InvalidArgument(_)), "{name}");
        }
    }

    #[test]
    fn test_threshold_comparison() {
        assert!(Level::Info.permits(Level::Error));
        assert!(Level::Info.permits(Level::Warning));
        assert!(Level::Info.permits(Level::Info));
        assert!(!Level::Info.permits(Level::Debug));

        assert!(Level::Warning.permits(Level::Error));
        assert!(!Level::Warning.permits(Level::Info));

        assert!(Level::Error.permits(Level::Error));
        assert!(!Level::Error.permits(Level::Warning));

        assert!(Level::Debug.permits(Level::Debug));
    }

    #[test]
    fn test_needs_sync_only_skips_info() {
        assert!(Level::Error.needs_sync());
        assert!(Level::Warning.needs_sync());
        assert!(!Level::Info.needs_sync());
        assert!(Level::Debug.needs_sync());
    }

    #[test]
    fn test_priority_round_trip() {
        for level in [Level::Error, Level::Warning, Level::Info, Level::Debug] {
            assert_eq!(Level::from_priority(level.priority()), Some(level));
        }
        assert_eq!(Level::from_priority(5), None);
    }

    #[test]
    fn test_from_tracing_level() {
        assert_eq!(Level::from(tracing::Level::TRACE), Level::Debug);
        assert_eq!(Level::from(tracing::Level::WARN), Level::Warning);
    }
}
