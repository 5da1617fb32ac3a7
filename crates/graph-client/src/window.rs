//! Date windows for lead queries.
//!
//! Two timezones are involved:
//!
//! - the *regional* timezone (fixed UTC+05:30) anchors "yesterday", custom
//!   ranges and display formatting;
//! - the *local* timezone (the server's, `chrono::Local` in production)
//!   anchors "today" and renders the `since`/`until` query dates.
//!
//! A window computed in one and rendered in the other can therefore shift the
//! query dates by a day when the two zones disagree on the calendar date.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Offset of the regional timezone, in seconds east of UTC.
pub const REGIONAL_UTC_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// The fixed regional timezone.
pub fn regional_timezone() -> FixedOffset {
    FixedOffset::east_opt(REGIONAL_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Named time filter selected by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFilter {
    Today,
    Yesterday,
    All,
    Custom,
}

impl TimeFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFilter::Today => "today",
            TimeFilter::Yesterday => "yesterday",
            TimeFilter::All => "all",
            TimeFilter::Custom => "custom",
        }
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeFilter {
    type Err = WindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(TimeFilter::Today),
            "yesterday" => Ok(TimeFilter::Yesterday),
            "all" => Ok(TimeFilter::All),
            "custom" => Ok(TimeFilter::Custom),
            other => Err(WindowError::UnknownFilter(other.to_string())),
        }
    }
}

/// How to treat missing or unparsable custom bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CustomRangePolicy {
    /// Fall back to no filtering.
    #[default]
    Lenient,
    /// Reject the request.
    Strict,
}

/// Errors produced while computing a window.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("Invalid timeFilter value: {0}")]
    UnknownFilter(String),

    #[error("startDate and endDate are required for custom timeFilter")]
    MissingBounds,

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Date out of range")]
    OutOfRange,
}

/// Inclusive instant range. `None` at the call sites means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// Whether `instant` falls inside the window.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Date-only `since`/`until` query values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryRange {
    pub since: Option<String>,
    pub until: Option<String>,
}

impl QueryRange {
    /// Query pairs to append to the first leads request.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(since) = &self.since {
            params.push(("since".to_string(), since.clone()));
        }
        if let Some(until) = &self.until {
            params.push(("until".to_string(), until.clone()));
        }
        params
    }

    pub fn is_empty(&self) -> bool {
        self.since.is_none() && self.until.is_none()
    }
}

/// Computes [`DateWindow`]s from a [`TimeFilter`].
#[derive(Debug, Clone)]
pub struct WindowCalculator<Tz: TimeZone = Local> {
    local: Tz,
    regional: FixedOffset,
    policy: CustomRangePolicy,
}

impl WindowCalculator<Local> {
    /// Calculator using the server's local timezone.
    pub fn new() -> Self {
        Self::with_local(Local)
    }
}

impl Default for WindowCalculator<Local> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Tz: TimeZone> WindowCalculator<Tz> {
    /// Calculator using an explicit local timezone.
    pub fn with_local(local: Tz) -> Self {
        Self {
            local,
            regional: regional_timezone(),
            policy: CustomRangePolicy::default(),
        }
    }

    /// Set the custom range policy.
    pub fn with_policy(mut self, policy: CustomRangePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Override the regional timezone.
    pub fn with_regional(mut self, regional: FixedOffset) -> Self {
        self.regional = regional;
        self
    }

    pub fn policy(&self) -> CustomRangePolicy {
        self.policy
    }

    /// Compute the window for `filter` as of `now`.
    pub fn compute(
        &self,
        filter: TimeFilter,
        start: Option<&str>,
        end: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<DateWindow>, WindowError> {
        let window = match filter {
            TimeFilter::Today => {
                let local_now = now.with_timezone(&self.local);
                let midnight = at(local_now.date_naive(), 0, 0, 0, 0)?;
                let fallback = local_now.offset().fix();
                Some(DateWindow {
                    start: resolve_local(&self.local, midnight, fallback),
                    end: now,
                })
            }
            TimeFilter::Yesterday => {
                let today = now.with_timezone(&self.regional).date_naive();
                let yesterday = today.pred_opt().ok_or(WindowError::OutOfRange)?;
                Some(self.regional_day_span(yesterday, yesterday)?)
            }
            TimeFilter::All => None,
            TimeFilter::Custom => self.custom(start, end)?,
        };

        debug!(filter = %filter, window = ?window, "Computed date window");
        Ok(window)
    }

    /// Render the upstream `since`/`until` dates in the local calendar.
    pub fn query_range(&self, filter: TimeFilter, window: Option<&DateWindow>) -> QueryRange {
        let Some(window) = window else {
            return QueryRange::default();
        };

        let since = Some(self.local_date(window.start));
        let until = match filter {
            TimeFilter::Today => None,
            _ => Some(self.local_date(window.end)),
        };
        QueryRange { since, until }
    }

    fn custom(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Option<DateWindow>, WindowError> {
        let bounds = match (non_empty(start), non_empty(end)) {
            (Some(start), Some(end)) => parse_date(start).and_then(|start| {
                parse_date(end).and_then(|end| self.regional_day_span(start, end))
            }),
            _ => Err(WindowError::MissingBounds),
        };

        match (bounds, self.policy) {
            (Ok(window), _) => Ok(Some(window)),
            (Err(err), CustomRangePolicy::Strict) => Err(err),
            (Err(err), CustomRangePolicy::Lenient) => {
                debug!(error = %err, "Ignoring custom range, no date filter applied");
                Ok(None)
            }
        }
    }

    /// 00:00:00.000 of `first` to 23:59:59.999 of `last`, regional time.
    fn regional_day_span(
        &self,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<DateWindow, WindowError> {
        let start = at(first, 0, 0, 0, 0)?;
        let end = at(last, 23, 59, 59, 999)?;
        Ok(DateWindow {
            start: resolve_local(&self.regional, start, self.regional),
            end: resolve_local(&self.regional, end, self.regional),
        })
    }

    fn local_date(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.local)
            .date_naive()
            .format("%Y-%m-%d")
            .to_string()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse `YYYY-MM-DD`, also taking the date part of a full timestamp.
fn parse_date(value: &str) -> Result<NaiveDate, WindowError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map_err(|_| WindowError::InvalidDate(value.to_string()))
}

fn at(date: NaiveDate, h: u32, m: u32, s: u32, ms: u32) -> Result<NaiveDateTime, WindowError> {
    date.and_hms_milli_opt(h, m, s, ms)
        .ok_or(WindowError::OutOfRange)
}

/// Map a wall-clock time in `tz` to an instant.
///
/// Ambiguous times take the earlier instant. Times skipped by a DST jump
/// are read with `fallback` as the offset.
fn resolve_local<Tz: TimeZone>(
    tz: &Tz,
    naive: NaiveDateTime,
    fallback: FixedOffset,
) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| {
            let offset = chrono::Duration::seconds(fallback.local_minus_utc().into());
            Utc.from_utc_datetime(&(naive - offset))
        })
}
