//! Column-major frame of period-keyed observations for a single route.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;

/// An ordered set of period rows with named `f64` columns.
///
/// Missing observations are stored as `NaN`. Timestamps are strictly
/// increasing; every constructor and mutator upholds that.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeSeriesFrame {
    timestamps: Vec<NaiveDate>,
    columns: Vec<String>,
    /// Values stored in column-major format: values[column][row]
    values: Vec<Vec<f64>>,
}

impl TimeSeriesFrame {
    /// Create a frame from timestamps, column names and column-major values.
    pub fn new(
        timestamps: Vec<NaiveDate>,
        columns: Vec<String>,
        values: Vec<Vec<f64>>,
    ) -> Result<Self> {
        for pair in timestamps.windows(2) {
            if pair[1] <= pair[0] {
                return Err(ForecastError::TimestampError(format!(
                    "timestamps must be strictly increasing ({} follows {})",
                    pair[1], pair[0]
                )));
            }
        }

        if columns.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: columns.len(),
                got: values.len(),
            });
        }

        for column in &values {
            if column.len() != timestamps.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: timestamps.len(),
                    got: column.len(),
                });
            }
        }

        for (i, name) in columns.iter().enumerate() {
            if columns[..i].contains(name) {
                return Err(ForecastError::InvalidParameter(format!(
                    "duplicate column name '{name}'"
                )));
            }
        }

        Ok(Self {
            timestamps,
            columns,
            values,
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    pub fn last_timestamp(&self) -> Option<NaiveDate> {
        self.timestamps.last().copied()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of a named column.
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.column_index(name)
            .map(|i| self.values[i].as_slice())
            .ok_or_else(|| ForecastError::UnknownColumn(name.to_string()))
    }

    /// Mutable values of a named column.
    pub fn column_mut(&mut self, name: &str) -> Result<&mut [f64]> {
        let index = self
            .column_index(name)
            .ok_or_else(|| ForecastError::UnknownColumn(name.to_string()))?;
        Ok(self.values[index].as_mut_slice())
    }

    pub fn values_by_column(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Row position of a timestamp.
    pub fn position(&self, timestamp: NaiveDate) -> Option<usize> {
        self.timestamps.binary_search(&timestamp).ok()
    }

    /// Values of one row across all columns.
    pub fn row(&self, index: usize) -> Result<Vec<f64>> {
        if index >= self.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "row {index} out of bounds for frame of {} rows",
                self.len()
            )));
        }
        Ok(self.values.iter().map(|col| col[index]).collect())
    }

    /// Append a row after the last timestamp.
    pub fn push_row(&mut self, timestamp: NaiveDate, row: Vec<f64>) -> Result<()> {
        if row.len() != self.width() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.width(),
                got: row.len(),
            });
        }
        if let Some(last) = self.last_timestamp() {
            if timestamp <= last {
                return Err(ForecastError::TimestampError(format!(
                    "cannot append {timestamp} after {last}"
                )));
            }
        }
        self.timestamps.push(timestamp);
        for (column, value) in self.values.iter_mut().zip(row) {
            column.push(value);
        }
        Ok(())
    }

    /// Append a row whose every value is missing.
    pub fn push_empty_row(&mut self, timestamp: NaiveDate) -> Result<()> {
        self.push_row(timestamp, vec![f64::NAN; self.width()])
    }

    /// Set a single cell.
    pub fn set_value(&mut self, row: usize, column: &str, value: f64) -> Result<()> {
        let len = self.len();
        let values = self.column_mut(column)?;
        let cell = values.get_mut(row).ok_or_else(|| {
            ForecastError::InvalidParameter(format!("row {row} out of bounds for {len} rows"))
        })?;
        *cell = value;
        Ok(())
    }

    /// Replace a column's values, or append the column if it does not exist yet.
    pub fn set_column(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if values.len() != self.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.len(),
                got: values.len(),
            });
        }
        match self.column_index(name) {
            Some(index) => self.values[index] = values,
            None => {
                self.columns.push(name.to_string());
                self.values.push(values);
            }
        }
        Ok(())
    }

    /// Rows in `start..end` as a new frame.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeriesFrame> {
        if start > end || end > self.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "invalid row range {start}..{end} for frame of {} rows",
                self.len()
            )));
        }
        Ok(TimeSeriesFrame {
            timestamps: self.timestamps[start..end].to_vec(),
            columns: self.columns.clone(),
            values: self
                .values
                .iter()
                .map(|col| col[start..end].to_vec())
                .collect(),
        })
    }

    /// Index of the first row at or after `timestamp` (`len()` if none).
    pub fn split_index(&self, timestamp: NaiveDate) -> usize {
        self.timestamps.partition_point(|t| *t < timestamp)
    }

    /// Check if any value in the named column is missing.
    pub fn has_missing(&self, name: &str) -> Result<bool> {
        Ok(self.column(name)?.iter().any(|v| !v.is_finite()))
    }

    /// Gather the named columns for rows `start..end` in row-major order.
    pub fn to_matrix(&self, columns: &[String], start: usize, end: usize) -> Result<FeatureMatrix> {
        if start > end || end > self.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "invalid row range {start}..{end} for frame of {} rows",
                self.len()
            )));
        }
        let sources = columns
            .iter()
            .map(|name| self.column(name))
            .collect::<Result<Vec<_>>>()?;
        let rows = (start..end)
            .map(|i| sources.iter().map(|col| col[i]).collect())
            .collect();
        FeatureMatrix::new(columns.to_vec(), rows)
    }
}

/// Row-major design matrix handed to point-forecast models.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        for row in &rows {
            if row.len() != columns.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: columns.len(),
                    got: row.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column across all rows.
    pub fn column_values(&self, index: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[index]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn months(n: usize) -> Vec<NaiveDate> {
        (0..n)
            .map(|i| NaiveDate::from_ymd_opt(2020 + (i / 12) as i32, (i % 12) as u32 + 1, 1).unwrap())
            .collect()
    }

    fn sample_frame() -> TimeSeriesFrame {
        TimeSeriesFrame::new(
            months(4),
            vec!["Seats".to_string(), "O_GDP".to_string()],
            vec![vec![1.0, 2.0, 3.0, 4.0], vec![10.0, f64::NAN, 30.0, 40.0]],
        )
        .unwrap()
    }

    #[test]
    fn frame_rejects_non_increasing_timestamps() {
        let mut ts = months(3);
        ts.swap(1, 2);
        let result = TimeSeriesFrame::new(ts, vec!["a".to_string()], vec![vec![1.0, 2.0, 3.0]]);
        assert!(matches!(result, Err(ForecastError::TimestampError(_))));
    }

    #[test]
    fn frame_validates_dimensions_and_names() {
        let short = TimeSeriesFrame::new(months(3), vec!["a".to_string()], vec![vec![1.0]]);
        assert!(matches!(short, Err(ForecastError::DimensionMismatch { .. })));

        let dup = TimeSeriesFrame::new(
            months(1),
            vec!["a".to_string(), "a".to_string()],
            vec![vec![1.0], vec![2.0]],
        );
        assert!(matches!(dup, Err(ForecastError::InvalidParameter(_))));
    }

    #[test]
    fn frame_push_row_keeps_order() {
        let mut frame = sample_frame();
        let next = NaiveDate::from_ymd_opt(2020, 5, 1).unwrap();
        frame.push_empty_row(next).unwrap();
        assert_eq!(frame.len(), 5);
        assert!(frame.column("Seats").unwrap()[4].is_nan());

        let stale = NaiveDate::from_ymd_opt(2020, 2, 1).unwrap();
        assert!(frame.push_empty_row(stale).is_err());
    }

    #[test]
    fn frame_set_column_appends_or_replaces() {
        let mut frame = sample_frame();
        frame.set_column("Year", vec![2020.0; 4]).unwrap();
        assert_eq!(frame.columns(), &["Seats", "O_GDP", "Year"]);
        frame.set_column("Seats", vec![0.0; 4]).unwrap();
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.column("Seats").unwrap(), &[0.0; 4]);
        assert!(frame.set_column("Short", vec![1.0]).is_err());
        assert!(matches!(
            frame.column("Missing"),
            Err(ForecastError::UnknownColumn(_))
        ));
    }

    #[test]
    fn frame_to_matrix_is_row_major() {
        let frame = sample_frame();
        let matrix = frame
            .to_matrix(&["O_GDP".to_string(), "Seats".to_string()], 2, 4)
            .unwrap();
        assert_eq!(matrix.n_rows(), 2);
        assert_eq!(matrix.rows()[0], vec![30.0, 3.0]);
        assert_eq!(matrix.column_values(1), vec![3.0, 4.0]);
    }

    #[test]
    fn frame_split_index() {
        let frame = sample_frame();
        let split = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        assert_eq!(frame.split_index(split), 2);
        let late = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        assert_eq!(frame.split_index(late), frame.len());
    }
}
