//! Date-range selection for a page load.
//!
//! The picker hands over two optional bounds. [`DateRangeInput::validate`]
//! turns them into a [`DateRange`] or the error that halts the page before
//! any statement is issued.

use std::fmt;

use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SfcostError};

/// Default number of days between the default start bound and today.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 31;

/// Longest accepted lookback, about ten years.
pub const MAX_LOOKBACK_DAYS: u32 = 3650;

/// A validated, non-empty date range with `start < end <= today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days spanned by the range.
    #[must_use]
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Raw picker state: either bound may still be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRangeInput {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRangeInput {
    #[must_use]
    pub const fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// The picker's initial state: `[today - lookback, today]`.
    ///
    /// A lookback reaching before the calendar's first date leaves the start
    /// bound unchosen.
    #[must_use]
    pub fn default_for(today: NaiveDate, lookback_days: u32) -> Self {
        Self {
            start: today.checked_sub_signed(Duration::days(i64::from(lookback_days))),
            end: Some(today),
        }
    }

    /// Validate against the picker ceiling `today`.
    ///
    /// # Errors
    ///
    /// * [`SfcostError::IncompleteDateRange`] when a bound is missing.
    /// * [`SfcostError::DateAfterToday`] when a bound lies past `today`.
    /// * [`SfcostError::InvalidDateRange`] when `start >= end`.
    pub fn validate(&self, today: NaiveDate) -> Result<DateRange> {
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return Err(SfcostError::IncompleteDateRange);
        };

        for date in [start, end] {
            if date > today {
                return Err(SfcostError::DateAfterToday { date, today });
            }
        }

        if start >= end {
            return Err(SfcostError::InvalidDateRange { start, end });
        }

        Ok(DateRange { start, end })
    }
}

/// Today's date in the local timezone.
#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`SfcostError::InvalidDate`] on anything else.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| SfcostError::InvalidDate(value.to_string()))
}

/// Parse a `START..END` range argument. An empty side is a missing bound.
///
/// # Errors
///
/// Returns [`SfcostError::InvalidDate`] when the separator is absent or a
/// side is not a date.
pub fn parse_range_arg(value: &str) -> Result<DateRangeInput> {
    let (start, end) = value
        .split_once("..")
        .ok_or_else(|| SfcostError::InvalidDate(value.to_string()))?;

    let side = |s: &str| -> Result<Option<NaiveDate>> {
        if s.trim().is_empty() {
            Ok(None)
        } else {
            parse_date(s).map(Some)
        }
    };

    Ok(DateRangeInput {
        start: side(start)?,
        end: side(end)?,
    })
}
