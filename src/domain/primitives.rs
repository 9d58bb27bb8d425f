//! Domain primitives: tenant-scoped identifiers, timestamps, and calendar
//! periods.

use chrono::{Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Organization (tenant) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrgId(pub Uuid);

impl OrgId {
    pub fn generate() -> Self {
        OrgId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Team member identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MemberId(pub Uuid);

impl MemberId {
    pub fn generate() -> Self {
        MemberId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deal identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DealId(pub Uuid);

impl DealId {
    pub fn generate() -> Self {
        DealId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for DealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    pub fn as_ms(&self) -> i64 {
        self.0
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        TimeMs(Utc::now().timestamp_millis())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),
    #[error("year must be between 1970 and 9999, got {0}")]
    InvalidYear(i32),
}

/// A calendar month in a specific year, the unit of commission aggregation.
///
/// All period boundaries are UTC. A deal belongs to the period containing its
/// paid timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub month: u32,
    pub year: i32,
}

impl Period {
    /// Validate a (month, year) pair into a period.
    ///
    /// # Errors
    /// Returns an error for a month outside 1..=12 or a year outside
    /// 1970..=9999.
    pub fn new(month: u32, year: i32) -> Result<Self, PeriodError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodError::InvalidMonth(month));
        }
        if !(1970..=9999).contains(&year) {
            return Err(PeriodError::InvalidYear(year));
        }
        Ok(Period { month, year })
    }

    /// The period a timestamp falls into (UTC).
    pub fn containing(at: TimeMs) -> Option<Self> {
        let dt = Utc.timestamp_millis_opt(at.as_ms()).single()?;
        Period::new(dt.month(), dt.year()).ok()
    }

    /// The immediately preceding period. January rolls back to December of
    /// the previous year.
    pub fn previous(&self) -> Period {
        if self.month == 1 {
            Period {
                month: 12,
                year: self.year - 1,
            }
        } else {
            Period {
                month: self.month - 1,
                year: self.year,
            }
        }
    }

    /// First instant of the month: day 1, 00:00:00.000 UTC.
    pub fn start_ms(&self) -> TimeMs {
        let start = Utc
            .with_ymd_and_hms(self.year, self.month, 1, 0, 0, 0)
            .single()
            .expect("validated period maps to a real UTC instant");
        TimeMs(start.timestamp_millis())
    }

    /// Last instant of the month: final day, 23:59:59.999 UTC.
    pub fn end_ms(&self) -> TimeMs {
        let (next_month, next_year) = if self.month == 12 {
            (1, self.year + 1)
        } else {
            (self.month + 1, self.year)
        };
        let next_start = Utc
            .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
            .single()
            .expect("validated period maps to a real UTC instant");
        TimeMs(next_start.timestamp_millis() - 1)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
