//! Route extraction, resampling and train/test preparation.

use crate::config::{AssemblerConfig, FitScope, PipelineConfig};
use crate::core::period::{month_start, shift_months};
use crate::core::{FeatureMatrix, Granularity, GranularityPolicy, TimeSeriesFrame};
use crate::error::{ForecastError, Result};
use crate::features::FeatureBuilder;
use crate::pipeline::dataset::RouteDataset;
use crate::preprocess::SeriesPreprocessor;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::debug;

/// Train/test design matrices of one route plus the frames they came from.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub x_train: FeatureMatrix,
    pub y_train: Vec<f64>,
    pub x_test: FeatureMatrix,
    pub y_test: Vec<f64>,
    pub train_periods: Vec<NaiveDate>,
    pub test_periods: Vec<NaiveDate>,
    /// Preprocessed frame with every feature column appended.
    pub frame: TimeSeriesFrame,
    /// Filled but unscaled frame without features, the rolling forecast's history.
    pub filled: TimeSeriesFrame,
    pub feature_columns: Vec<String>,
}

impl PreparedData {
    pub fn n_train(&self) -> usize {
        self.y_train.len()
    }

    pub fn n_test(&self) -> usize {
        self.y_test.len()
    }
}

/// Test window in months after the granularity adjustment.
///
/// Quarterly data holds out at most two quarters; yearly data holds out nothing.
pub fn effective_test_size(granularity: Granularity, test_size: usize) -> usize {
    match granularity {
        Granularity::Monthly => test_size,
        Granularity::Quarterly => test_size.min(6),
        Granularity::Yearly => 0,
    }
}

/// Builds one route's series from the shared dataset and owns the components
/// fitted on it.
#[derive(Debug)]
pub struct RouteSeriesAssembler<'a> {
    dataset: &'a RouteDataset,
    config: AssemblerConfig,
    policy: GranularityPolicy,
    fit_scope: FitScope,
    preprocessor: SeriesPreprocessor,
    features: FeatureBuilder,
}

impl<'a> RouteSeriesAssembler<'a> {
    pub fn new(dataset: &'a RouteDataset, config: &PipelineConfig) -> Self {
        let policy = config.granularity.policy();
        Self {
            dataset,
            config: config.assembler.clone(),
            fit_scope: config.fit_scope,
            preprocessor: SeriesPreprocessor::new(config.preprocessor.clone(), config.granularity),
            features: FeatureBuilder::new(config.features.clone(), policy.clone()),
            policy,
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.policy.granularity()
    }

    pub fn preprocessor(&self) -> &SeriesPreprocessor {
        &self.preprocessor
    }

    /// Hand over the fitted preprocessor and feature builder.
    pub fn into_components(self) -> (SeriesPreprocessor, FeatureBuilder) {
        (self.preprocessor, self.features)
    }

    /// Extract and resample the series of one route.
    pub fn assemble(&self, origin: &str, destination: &str) -> Result<TimeSeriesFrame> {
        let keep: Vec<usize> = self
            .dataset
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, name)| !self.config.drop_columns.contains(name))
            .map(|(i, _)| i)
            .collect();
        let columns: Vec<String> = keep
            .iter()
            .map(|&i| self.dataset.columns()[i].clone())
            .collect();

        let mut seen = HashSet::new();
        let mut rows: Vec<(NaiveDate, Vec<f64>)> = Vec::new();
        let mut matched = 0usize;
        for record in self.dataset.route_records(origin, destination) {
            matched += 1;
            let period = month_start(record.period);
            let values = keep
                .iter()
                .map(|&i| {
                    record.values.get(i).copied().ok_or(ForecastError::DimensionMismatch {
                        expected: self.dataset.columns().len(),
                        got: record.values.len(),
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            let key = (period, values.iter().map(|v| v.to_bits()).collect::<Vec<u64>>());
            if !seen.insert(key) {
                continue;
            }
            if self.config.excluded_months.contains(&period) {
                continue;
            }
            rows.push((period, values));
        }

        if matched == 0 {
            return Err(ForecastError::EmptyRoute {
                origin: origin.to_string(),
                destination: destination.to_string(),
            });
        }
        if rows.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        rows.sort_by_key(|(period, _)| *period);

        let mut frame = self.resample(columns, &rows)?;
        if self.granularity() != Granularity::Monthly && self.config.drop_last_period {
            let n = frame.len().saturating_sub(1);
            frame = frame.slice(0, n)?;
        }
        debug!(
            origin,
            destination,
            records = matched,
            periods = frame.len(),
            granularity = %self.granularity(),
            "route assembled"
        );
        Ok(frame)
    }

    /// Aggregate sorted rows onto the contiguous grid of period starts.
    fn resample(
        &self,
        columns: Vec<String>,
        rows: &[(NaiveDate, Vec<f64>)],
    ) -> Result<TimeSeriesFrame> {
        let (first, last) = match (rows.first(), rows.last()) {
            (Some(f), Some(l)) => (self.policy.period_start(f.0), self.policy.period_start(l.0)),
            _ => return Err(ForecastError::EmptyData),
        };

        let mut periods = vec![first];
        while let Some(&current) = periods.last() {
            if current >= last {
                break;
            }
            periods.push(self.policy.advance(current, 1)?);
        }

        let additive: Vec<bool> = columns
            .iter()
            .map(|c| *c == self.config.target_column || self.config.additive_columns.contains(c))
            .collect();
        let mut sums = vec![vec![0.0; periods.len()]; columns.len()];
        let mut counts = vec![vec![0usize; periods.len()]; columns.len()];

        for (period, values) in rows {
            let bin = periods
                .binary_search(&self.policy.period_start(*period))
                .map_err(|_| {
                    ForecastError::TimestampError(format!("period {period} outside resample grid"))
                })?;
            for (c, &v) in values.iter().enumerate() {
                if v.is_finite() {
                    sums[c][bin] += v;
                    counts[c][bin] += 1;
                }
            }
        }

        let values = sums
            .into_iter()
            .zip(counts)
            .zip(&additive)
            .map(|((sum, count), &is_sum)| {
                sum.iter()
                    .zip(&count)
                    .map(|(&s, &n)| match n {
                        0 => f64::NAN,
                        _ if is_sum => s,
                        _ => s / n as f64,
                    })
                    .collect()
            })
            .collect();
        TimeSeriesFrame::new(periods, columns, values)
    }

    /// Fit the preprocessor and feature builder and split into train and test.
    ///
    /// `test_size` is in months; rows at or after `last - (test_size - 1)`
    /// months are held out. A size of zero puts every row in training.
    pub fn prepare_data(
        &mut self,
        origin: &str,
        destination: &str,
        test_size: usize,
    ) -> Result<PreparedData> {
        let raw = self.assemble(origin, destination)?;
        let last = raw.last_timestamp().ok_or(ForecastError::EmptyData)?;
        let test_size = effective_test_size(self.granularity(), test_size);
        let test_months = i32::try_from(test_size).map_err(|_| {
            ForecastError::InvalidParameter(format!("test size of {test_size} months is too large"))
        })?;
        let test_start = shift_months(last, 1 - test_months)?;
        let split = raw.split_index(test_start);
        if split == 0 {
            return Err(ForecastError::InsufficientData {
                needed: raw.len() + 1,
                got: raw.len(),
            });
        }

        let fit_frame = match self.fit_scope {
            FitScope::FullFrame => raw.clone(),
            FitScope::TrainOnly => raw.slice(0, split)?,
        };
        self.preprocessor.fit(&fit_frame)?;
        let filled = self.preprocessor.fill(&raw)?;
        let mut scaled = filled.clone();
        self.preprocessor.scale(&mut scaled)?;

        match self.fit_scope {
            FitScope::FullFrame => self.features.fit(&scaled)?,
            FitScope::TrainOnly => self.features.fit(&scaled.slice(0, split)?)?,
        }
        let frame = self.features.transform(&scaled)?;

        let feature_columns = self.features.feature_columns(&frame);
        let target = frame.column(self.features.target_column())?;
        let n = frame.len();
        let prepared = PreparedData {
            x_train: frame.to_matrix(&feature_columns, 0, split)?,
            y_train: target[..split].to_vec(),
            x_test: frame.to_matrix(&feature_columns, split, n)?,
            y_test: target[split..].to_vec(),
            train_periods: frame.timestamps()[..split].to_vec(),
            test_periods: frame.timestamps()[split..].to_vec(),
            feature_columns,
            filled,
            frame,
        };
        debug!(
            origin,
            destination,
            train = prepared.n_train(),
            test = prepared.n_test(),
            features = prepared.feature_columns.len(),
            "route data prepared"
        );
        Ok(prepared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureConfig;
    use crate::pipeline::dataset::RawRecord;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn dataset(months: usize) -> RouteDataset {
        let columns = vec![
            "Route_Total_Seats".to_string(),
            "Avg Fare (USD)".to_string(),
            "Equipment".to_string(),
        ];
        let mut records = Vec::new();
        for i in 0..months {
            let period = shift_months(date(2019, 1), i as i32).unwrap();
            records.push(RawRecord::new(
                period,
                "CAN",
                "PEK",
                vec![1000.0 + 10.0 * i as f64, 100.0 + i as f64, 7.0],
            ));
        }
        records.push(RawRecord::new(date(2019, 1), "PEK", "SHA", vec![1.0, 1.0, 1.0]));
        RouteDataset::from_records(columns, records).unwrap()
    }

    fn config(granularity: Granularity) -> PipelineConfig {
        let mut config = PipelineConfig::new(granularity);
        config.assembler.excluded_months.clear();
        config.features = FeatureConfig::default().with_ts_forecast(false);
        config
    }

    #[test]
    fn missing_route_is_an_input_error() {
        let data = dataset(12);
        let assembler = RouteSeriesAssembler::new(&data, &config(Granularity::Monthly));
        assert_eq!(
            assembler.assemble("XXX", "YYY").unwrap_err(),
            ForecastError::EmptyRoute {
                origin: "XXX".into(),
                destination: "YYY".into()
            }
        );
    }

    #[test]
    fn assemble_drops_columns_duplicates_and_excluded_months() {
        let mut data = dataset(12);
        data.push(RawRecord::new(date(2019, 3), "CAN", "PEK", vec![1020.0, 102.0, 7.0]))
            .unwrap();
        let cfg = config(Granularity::Monthly);
        let mut cfg_excluded = cfg.clone();
        cfg_excluded.assembler = cfg.assembler.clone().with_excluded_months(vec![date(2019, 5)]);

        let frame = RouteSeriesAssembler::new(&data, &cfg_excluded)
            .assemble("CAN", "PEK")
            .unwrap();
        assert!(!frame.has_column("Equipment"));
        assert_eq!(frame.len(), 12);
        // duplicate of March is dropped, not summed
        assert_relative_eq!(frame.column("Route_Total_Seats").unwrap()[2], 1020.0);
        // May survives as an empty bin of the regular grid
        assert!(frame.column("Route_Total_Seats").unwrap()[4].is_nan());
    }

    #[test]
    fn quarterly_resample_sums_target_and_averages_covariates() {
        let data = dataset(12);
        let frame = RouteSeriesAssembler::new(&data, &config(Granularity::Quarterly))
            .assemble("CAN", "PEK")
            .unwrap();
        // four quarters, the last dropped as possibly incomplete
        assert_eq!(frame.timestamps(), &[date(2019, 1), date(2019, 4), date(2019, 7)]);
        let seats = frame.column("Route_Total_Seats").unwrap();
        assert_relative_eq!(seats[0], 1000.0 + 1010.0 + 1020.0);
        let fare = frame.column("Avg Fare (USD)").unwrap();
        assert_relative_eq!(fare[1], 104.0);
    }

    #[test]
    fn prepare_data_splits_on_trailing_months() {
        let data = dataset(36);
        let mut assembler = RouteSeriesAssembler::new(&data, &config(Granularity::Monthly));
        let prepared = assembler.prepare_data("CAN", "PEK", 12).unwrap();
        assert_eq!(prepared.n_train(), 24);
        assert_eq!(prepared.n_test(), 12);
        assert_eq!(prepared.test_periods[0], date(2021, 1));
        assert_eq!(prepared.x_train.n_cols(), prepared.feature_columns.len());
        assert!(!prepared
            .feature_columns
            .contains(&"Route_Total_Seats".to_string()));
        assert!(prepared
            .feature_columns
            .contains(&"Route_Total_Seats_lag_1".to_string()));
    }

    #[test]
    fn granularity_adjusts_test_window() {
        assert_eq!(effective_test_size(Granularity::Monthly, 12), 12);
        assert_eq!(effective_test_size(Granularity::Quarterly, 12), 6);
        assert_eq!(effective_test_size(Granularity::Yearly, 12), 0);

        let data = dataset(48);
        let mut yearly = RouteSeriesAssembler::new(&data, &config(Granularity::Yearly));
        let prepared = yearly.prepare_data("CAN", "PEK", 12).unwrap();
        assert_eq!(prepared.n_test(), 0);
        assert_eq!(prepared.n_train(), 3);

        let mut quarterly = RouteSeriesAssembler::new(&data, &config(Granularity::Quarterly));
        let prepared = quarterly.prepare_data("CAN", "PEK", 12).unwrap();
        assert_eq!(prepared.n_test(), 2);
    }

    #[test]
    fn oversized_test_window_is_an_error() {
        let data = dataset(36);
        let mut assembler = RouteSeriesAssembler::new(&data, &config(Granularity::Monthly));
        assert!(matches!(
            assembler.prepare_data("CAN", "PEK", usize::MAX),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(matches!(
            assembler.prepare_data("CAN", "PEK", 1000),
            Err(ForecastError::InsufficientData { .. })
        ));
    }

    #[test]
    fn fit_scope_controls_fit_statistics() {
        let data = dataset(36);
        let full_cfg = config(Granularity::Monthly);
        let train_cfg = config(Granularity::Monthly).with_fit_scope(FitScope::TrainOnly);

        let mut full = RouteSeriesAssembler::new(&data, &full_cfg);
        full.prepare_data("CAN", "PEK", 12).unwrap();
        let mut train = RouteSeriesAssembler::new(&data, &train_cfg);
        train.prepare_data("CAN", "PEK", 12).unwrap();

        let full_max = full.preprocessor().stats("Avg Fare (USD)").unwrap().max;
        let train_max = train.preprocessor().stats("Avg Fare (USD)").unwrap().max;
        assert_relative_eq!(full_max, 135.0);
        assert_relative_eq!(train_max, 123.0);
    }
}
