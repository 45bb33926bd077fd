//! Autoregressive multi-step forecast driven by a fitted point model.

use crate::core::period::advance;
use crate::core::{ForecastRow, Granularity, TimeSeriesFrame};
use crate::error::{ForecastError, Result};
use crate::features::FeatureBuilder;
use crate::models::PointModel;
use crate::preprocess::SeriesPreprocessor;
use tracing::debug;

/// Rolls a point model forward one period at a time, feeding every
/// prediction back into the target column as if it had been observed.
///
/// The preprocessor and feature builder must already be fitted; the loop only
/// calls their transform paths.
pub struct RollingForecaster<'a> {
    preprocessor: &'a SeriesPreprocessor,
    features: &'a FeatureBuilder,
    model: &'a dyn PointModel,
    history: TimeSeriesFrame,
    feature_columns: Vec<String>,
    granularity: Granularity,
}

impl<'a> RollingForecaster<'a> {
    /// `history` is the filled, unscaled frame without feature columns.
    /// `feature_columns` is the column set the model was trained on.
    pub fn new(
        preprocessor: &'a SeriesPreprocessor,
        features: &'a FeatureBuilder,
        model: &'a dyn PointModel,
        history: TimeSeriesFrame,
        feature_columns: Vec<String>,
        granularity: Granularity,
    ) -> Result<Self> {
        if history.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if !preprocessor.is_fitted() || !features.is_fitted() || !model.is_fitted() {
            return Err(ForecastError::FitRequired);
        }
        history.column(features.target_column())?;
        Ok(Self {
            preprocessor,
            features,
            model,
            history,
            feature_columns,
            granularity,
        })
    }

    pub fn history(&self) -> &TimeSeriesFrame {
        &self.history
    }

    /// Forecast `periods` steps past the end of the history.
    ///
    /// Returns one `Future` row per step with strictly increasing periods.
    /// Any failure aborts the whole forecast.
    pub fn forecast(&self, periods: usize) -> Result<Vec<ForecastRow>> {
        let target = self.features.target_column();
        let mut accumulated = self.history.clone();
        let mut last = accumulated
            .last_timestamp()
            .ok_or(ForecastError::EmptyData)?;
        let mut rows = Vec::with_capacity(periods);

        for step in 0..periods {
            let next = advance(last, self.granularity, 1)?;
            accumulated.push_empty_row(next)?;
            accumulated = self.preprocessor.fill(&accumulated)?;

            let mut scaled = accumulated.clone();
            self.preprocessor.scale(&mut scaled)?;
            let featured = self.features.transform(&scaled)?;

            let row = featured.len() - 1;
            let x = featured.to_matrix(&self.feature_columns, row, row + 1)?;
            let predicted = self
                .model
                .predict(&x)?
                .first()
                .copied()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    ForecastError::ComputationError(format!(
                        "{} produced no finite prediction for {next}",
                        self.model.name()
                    ))
                })?;

            accumulated.set_value(row, target, predicted)?;
            debug!(step, period = %next, predicted, "rolling forecast step");
            rows.push(ForecastRow::future(next, predicted));
            last = next;
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FeatureConfig, PreprocessorConfig};
    use crate::core::FeatureMatrix;
    use crate::models::TimeModelKind;
    use chrono::NaiveDate;

    /// Predicts the lag-1 feature plus a constant step.
    struct LagPlus(f64);

    impl PointModel for LagPlus {
        fn fit(&mut self, _x: &FeatureMatrix, _y: &[f64]) -> Result<()> {
            Ok(())
        }

        fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
            let index = x
                .columns()
                .iter()
                .position(|c| c == "Seats_lag_1")
                .ok_or_else(|| ForecastError::UnknownColumn("Seats_lag_1".into()))?;
            Ok(x.rows().iter().map(|r| r[index] + self.0).collect())
        }

        fn name(&self) -> &str {
            "LagPlus"
        }

        fn is_fitted(&self) -> bool {
            true
        }
    }

    fn history(granularity: Granularity, n: usize) -> TimeSeriesFrame {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let dates = (0..n)
            .map(|i| advance(start, granularity, i as i32).unwrap())
            .collect();
        let seats = (0..n).map(|i| 100.0 + i as f64).collect();
        let fare = (0..n).map(|i| 50.0 + 0.5 * i as f64).collect();
        TimeSeriesFrame::new(dates, vec!["Seats".into(), "Fare".into()], vec![seats, fare]).unwrap()
    }

    fn components(
        granularity: Granularity,
        frame: &TimeSeriesFrame,
    ) -> (SeriesPreprocessor, FeatureBuilder, Vec<String>) {
        let config = PreprocessorConfig::default()
            .with_tail_model(TimeModelKind::Linear)
            .with_unscaled_columns(vec!["Seats".into()]);
        let mut preprocessor = SeriesPreprocessor::new(config, granularity);
        preprocessor.fit(frame).unwrap();

        let features = FeatureConfig {
            target_column: "Seats".into(),
            ..FeatureConfig::default()
        }
        .with_ts_forecast(false);
        let mut builder = FeatureBuilder::new(features, granularity.policy());
        let featured = builder.fit_transform(frame).unwrap();
        let columns = builder.feature_columns(&featured);
        (preprocessor, builder, columns)
    }

    #[test]
    fn forecast_feeds_predictions_back_as_history() {
        let frame = history(Granularity::Monthly, 24);
        let (pre, builder, columns) = components(Granularity::Monthly, &frame);
        let model = LagPlus(1.0);
        let rolling =
            RollingForecaster::new(&pre, &builder, &model, frame, columns, Granularity::Monthly)
                .unwrap();

        let rows = rolling.forecast(5).unwrap();
        assert_eq!(rows.len(), 5);
        let values: Vec<f64> = rows.iter().map(|r| r.predicted).collect();
        assert_eq!(values, vec![124.0, 125.0, 126.0, 127.0, 128.0]);
        assert_eq!(rows[0].period, NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
        assert!(rows.iter().all(|r| r.is_future()));
    }

    #[test]
    fn forecast_steps_by_granularity() {
        for granularity in [Granularity::Monthly, Granularity::Quarterly, Granularity::Yearly] {
            let frame = history(granularity, 12);
            let (pre, builder, columns) = components(granularity, &frame);
            let model = LagPlus(0.0);
            let rolling =
                RollingForecaster::new(&pre, &builder, &model, frame, columns, granularity)
                    .unwrap();
            let rows = rolling.forecast(4).unwrap();
            assert_eq!(rows.len(), 4);
            for pair in rows.windows(2) {
                assert_eq!(advance(pair[0].period, granularity, 1).unwrap(), pair[1].period);
            }
        }
    }

    #[test]
    fn zero_periods_is_empty_and_history_is_untouched() {
        let frame = history(Granularity::Monthly, 12);
        let (pre, builder, columns) = components(Granularity::Monthly, &frame);
        let model = LagPlus(1.0);
        let rolling = RollingForecaster::new(
            &pre,
            &builder,
            &model,
            frame.clone(),
            columns,
            Granularity::Monthly,
        )
        .unwrap();
        assert!(rolling.forecast(0).unwrap().is_empty());
        rolling.forecast(3).unwrap();
        assert_eq!(rolling.history(), &frame);
    }

    #[test]
    fn unfitted_components_are_rejected() {
        let frame = history(Granularity::Monthly, 12);
        let pre = SeriesPreprocessor::new(PreprocessorConfig::default(), Granularity::Monthly);
        let (_, builder, columns) = components(Granularity::Monthly, &frame);
        let model = LagPlus(1.0);
        let result =
            RollingForecaster::new(&pre, &builder, &model, frame, columns, Granularity::Monthly);
        assert!(matches!(result, Err(ForecastError::FitRequired)));
    }
}
