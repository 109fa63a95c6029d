//! Rotation cycles and period keys
//!
//! A period key names the wall-clock period (day, hour or minute) a log file
//! belongs to. Keys of the same cycle sort lexicographically in time order.

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Local, NaiveDate};

use crate::error::LogError;

/// How often the log file rolls over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotateCycle {
    #[default]
    Day,
    Hour,
    Minute,
    /// Never rotate; everything goes to `{prefix}.log`
    None,
}

impl RotateCycle {
    /// Name accepted by [`RotateCycle::from_str`]
    pub fn as_str(&self) -> &'static str {
        match self {
            RotateCycle::Day => "D",
            RotateCycle::Hour => "H",
            RotateCycle::Minute => "M",
            RotateCycle::None => "NONE",
        }
    }

    /// Compute the key of the period containing `now`
    pub fn period_key(&self, now: &DateTime<Local>) -> PeriodKey {
        let key = match self {
            RotateCycle::Day => now.format("%Y-%m-%d").to_string(),
            RotateCycle::Hour => now.format("%Y-%m-%d-%H").to_string(),
            RotateCycle::Minute => now.format("%Y-%m-%d-%H-%M").to_string(),
            RotateCycle::None => String::new(),
        };
        PeriodKey(key)
    }
}

impl fmt::Display for RotateCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RotateCycle {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "D" => Ok(RotateCycle::Day),
            "H" => Ok(RotateCycle::Hour),
            "M" => Ok(RotateCycle::Minute),
            "NONE" => Ok(RotateCycle::None),
            _ => Err(LogError::InvalidArgument(format!(
                "unknown rotate cycle '{}' (expected D, H, M or NONE)",
                s
            ))),
        }
    }
}

/// Identity of one rotation period
///
/// The key for [`RotateCycle::None`] is empty and never changes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodKey(String);

impl PeriodKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the constant key of a non-rotating logger
    pub fn is_constant(&self) -> bool {
        self.0.is_empty()
    }

    /// Recognize a day, hour or minute key such as `2024-05-01-14`
    ///
    /// The constant key is never returned.
    pub fn parse(s: &str) -> Option<Self> {
        let date = s.get(..10)?;
        let shaped = date.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
        if !shaped || NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            return None;
        }

        let tail = &s[10..];
        if !tail.is_empty() {
            let fields: Vec<&str> = tail.strip_prefix('-')?.split('-').collect();
            // hour, then minute
            let limits = [24u32, 60];
            if fields.len() > limits.len() {
                return None;
            }
            for (field, limit) in fields.into_iter().zip(limits) {
                if field.len() != 2 || !field.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                if field.parse::<u32>().ok()? >= limit {
                    return None;
                }
            }
        }
        Some(PeriodKey(s.to_string()))
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of wall-clock time for timestamps and rotation checks
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// The local system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to
///
/// Used to drive rotation boundaries deterministically in tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Local>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
