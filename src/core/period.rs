//! Granularity policy and calendar-period arithmetic.
//!
//! Every series handled by the crate is keyed by the first day of its period:
//! the first of the month for monthly data, the first month of the quarter
//! (January, April, July, October) for quarterly data and January for yearly
//! data. All arithmetic works on `(year, month)` pairs directly.

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Aggregation period of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl Granularity {
    /// Number of calendar months covered by one period.
    pub fn period_months(self) -> u32 {
        match self {
            Granularity::Monthly => 1,
            Granularity::Quarterly => 3,
            Granularity::Yearly => 12,
        }
    }

    /// Seasonal cycle length in periods, if the granularity has one.
    pub fn seasonal_period(self) -> Option<usize> {
        match self {
            Granularity::Monthly => Some(12),
            Granularity::Quarterly => Some(4),
            Granularity::Yearly => None,
        }
    }

    /// Build the immutable policy for this granularity.
    pub fn policy(self) -> GranularityPolicy {
        GranularityPolicy::new(self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Monthly => "monthly",
            Granularity::Quarterly => "quarterly",
            Granularity::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" | "month" | "ms" => Ok(Granularity::Monthly),
            "quarterly" | "quarter" | "qs" => Ok(Granularity::Quarterly),
            "yearly" | "year" | "annual" | "ys" => Ok(Granularity::Yearly),
            _ => Err(ForecastError::UnknownGranularity(s.to_string())),
        }
    }
}

/// Per-granularity resampling and feature settings.
///
/// Built once per run from a [`Granularity`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GranularityPolicy {
    granularity: Granularity,
    resample_rule: String,
    lag_offsets: Vec<usize>,
    rolling_windows: Vec<usize>,
    seasonal_months: Vec<u32>,
}

impl GranularityPolicy {
    pub fn new(granularity: Granularity) -> Self {
        let (rule, lags, windows, seasonal): (&str, &[usize], &[usize], &[u32]) = match granularity
        {
            Granularity::Monthly => ("MS", &[1, 3, 6], &[3, 6, 12], &[1, 2, 7, 8]),
            // Q1 carries the spring-festival peak.
            Granularity::Quarterly => ("QS", &[1, 2, 4], &[2, 4], &[1]),
            Granularity::Yearly => ("YS", &[1, 2], &[2], &[]),
        };
        Self {
            granularity,
            resample_rule: rule.to_string(),
            lag_offsets: lags.to_vec(),
            rolling_windows: windows.to_vec(),
            seasonal_months: seasonal.to_vec(),
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn resample_rule(&self) -> &str {
        &self.resample_rule
    }

    pub fn lag_offsets(&self) -> &[usize] {
        &self.lag_offsets
    }

    pub fn rolling_windows(&self) -> &[usize] {
        &self.rolling_windows
    }

    /// Months treated as demand peaks. Empty for yearly data.
    pub fn seasonal_months(&self) -> &[u32] {
        &self.seasonal_months
    }

    pub fn period_months(&self) -> u32 {
        self.granularity.period_months()
    }

    pub fn is_seasonal_month(&self, month: u32) -> bool {
        self.seasonal_months.contains(&month)
    }

    /// Canonical period key for a date under this policy.
    pub fn period_start(&self, date: NaiveDate) -> NaiveDate {
        period_start(date, self.granularity)
    }

    /// The period `steps` periods after (or before, if negative) `date`.
    pub fn advance(&self, date: NaiveDate, steps: i32) -> Result<NaiveDate> {
        advance(date, self.granularity, steps)
    }
}

impl Default for GranularityPolicy {
    fn default() -> Self {
        Self::new(Granularity::Monthly)
    }
}

/// Canonical start of the period containing `date`.
pub fn period_start(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    let step = granularity.period_months();
    let month = (date.month() - 1) / step * step + 1;
    NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date)
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    period_start(date, Granularity::Monthly)
}

/// Shift a date by a signed number of calendar months.
pub fn shift_months(date: NaiveDate, months: i32) -> Result<NaiveDate> {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.ok_or_else(|| {
        ForecastError::TimestampError(format!("cannot shift {date} by {months} months"))
    })
}

/// Advance `date` by `steps` periods, snapping to the canonical period start first.
pub fn advance(date: NaiveDate, granularity: Granularity, steps: i32) -> Result<NaiveDate> {
    let start = period_start(date, granularity);
    shift_months(start, steps * granularity.period_months() as i32)
}

/// Signed number of whole calendar months from `from` to `to`.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32
}

/// Signed number of whole periods from `from` to `to`.
pub fn periods_between(from: NaiveDate, to: NaiveDate, granularity: Granularity) -> i32 {
    let from = period_start(from, granularity);
    let to = period_start(to, granularity);
    months_between(from, to) / granularity.period_months() as i32
}

/// Calendar quarter (1-4) of a date.
pub fn quarter_of(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

/// Format a period key the way charts and reports label it.
pub fn format_period(date: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Monthly => format!("{}-{:02}", date.year(), date.month()),
        Granularity::Quarterly => format!("{}-Q{}", date.year(), quarter_of(date)),
        Granularity::Yearly => format!("{}", date.year()),
    }
}

/// Parse a `YYYY-Qn` quarter label into the quarter's start date.
pub fn parse_quarter_label(label: &str) -> Result<NaiveDate> {
    let invalid = || ForecastError::TimestampError(format!("malformed quarter label: {label}"));
    let (year, quarter) = label.trim().split_once("-Q").ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let quarter: u32 = quarter.parse().map_err(|_| invalid())?;
    if !(1..=4).contains(&quarter) {
        return Err(invalid());
    }
    NaiveDate::from_ymd_opt(year, (quarter - 1) * 3 + 1, 1).ok_or_else(invalid)
}
