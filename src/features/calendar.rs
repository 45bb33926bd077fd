//! Calendar features derived from period keys.

use crate::core::period::quarter_of;
use crate::core::GranularityPolicy;
use chrono::{Datelike, NaiveDate};

pub const YEAR: &str = "Year";
pub const MONTH: &str = "Month";
pub const QUARTER: &str = "Quarter";
pub const IS_HOLIDAY: &str = "Is_holiday";

/// `Year`, `Month`, `Quarter` and `Is_holiday` columns for the given periods.
///
/// `Is_holiday` is 1 when the period's month is one of the policy's seasonal months.
pub fn calendar_columns(
    timestamps: &[NaiveDate],
    policy: &GranularityPolicy,
) -> Vec<(&'static str, Vec<f64>)> {
    let year = timestamps.iter().map(|d| d.year() as f64).collect();
    let month = timestamps.iter().map(|d| d.month() as f64).collect();
    let quarter = timestamps.iter().map(|&d| quarter_of(d) as f64).collect();
    let holiday = timestamps
        .iter()
        .map(|d| if policy.is_seasonal_month(d.month()) { 1.0 } else { 0.0 })
        .collect();
    vec![
        (YEAR, year),
        (MONTH, month),
        (QUARTER, quarter),
        (IS_HOLIDAY, holiday),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Granularity;

    #[test]
    fn quarterly_holiday_flags_first_quarter() {
        let dates: Vec<NaiveDate> = [1, 4, 7, 10]
            .iter()
            .map(|&m| NaiveDate::from_ymd_opt(2023, m, 1).unwrap())
            .collect();
        let columns = calendar_columns(&dates, &Granularity::Quarterly.policy());
        assert_eq!(columns[2].1, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(columns[3].0, IS_HOLIDAY);
        assert_eq!(columns[3].1, vec![1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn monthly_holiday_months() {
        let dates: Vec<NaiveDate> = (1..=12)
            .map(|m| NaiveDate::from_ymd_opt(2023, m, 1).unwrap())
            .collect();
        let columns = calendar_columns(&dates, &Granularity::Monthly.policy());
        let flagged: Vec<u32> = (1..=12).filter(|&m| columns[3].1[m as usize - 1] == 1.0).collect();
        assert_eq!(flagged, vec![1, 2, 7, 8]);
        assert!(columns[0].1.iter().all(|&y| y == 2023.0));
    }
}
