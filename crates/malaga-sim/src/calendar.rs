//! Which dates the simulator walks.

use chrono::{Datelike, Weekday};
use derive_more::Display;
use malaga_traits::{Date, DateRange, MalagaError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Policy for turning observed data dates into a simulation calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarPolicy {
    /// Only dates that have a snapshot.
    #[default]
    #[display("observed")]
    Observed,
    /// Every Monday to Friday between the bounds; dates without data are
    /// recorded as skipped.
    #[display("weekdays")]
    Weekdays,
}

impl CalendarPolicy {
    /// Builds the ascending list of dates to simulate.
    ///
    /// `observed` must be ascending. Bounds in `range` override the first
    /// and last observed dates.
    pub fn dates(&self, observed: &[Date], range: &DateRange) -> Vec<Date> {
        match self {
            Self::Observed => observed
                .iter()
                .copied()
                .filter(|d| range.contains(*d))
                .collect(),
            Self::Weekdays => {
                let start = range.start.or_else(|| observed.first().copied());
                let end = range.end.or_else(|| observed.last().copied());
                let (Some(start), Some(end)) = (start, end) else {
                    return Vec::new();
                };
                start
                    .iter_days()
                    .take_while(|d| *d <= end)
                    .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
                    .collect()
            }
        }
    }
}

impl FromStr for CalendarPolicy {
    type Err = MalagaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "observed" => Ok(Self::Observed),
            "weekdays" => Ok(Self::Weekdays),
            other => Err(MalagaError::InvalidConfig(format!(
                "unknown calendar policy '{other}' (expected observed or weekdays)"
            ))),
        }
    }
}
