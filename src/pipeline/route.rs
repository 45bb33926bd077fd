//! End-to-end forecast of a single route.

use crate::config::PipelineConfig;
use crate::core::{ForecastRow, Granularity, Segment};
use crate::error::{ForecastError, Result};
use crate::models::ModelSpec;
use crate::pipeline::assembler::RouteSeriesAssembler;
use crate::pipeline::dataset::RouteDataset;
use crate::pipeline::rolling::RollingForecaster;
use crate::utils::{calculate_metrics, AccuracyMetrics};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Result table and accuracy of one route run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteForecast {
    pub origin: String,
    pub destination: String,
    pub granularity: Granularity,
    pub model: String,
    /// Train and Test rows (when history is included) followed by Future rows.
    pub rows: Vec<ForecastRow>,
    pub train_metrics: AccuracyMetrics,
    pub test_metrics: Option<AccuracyMetrics>,
    pub feature_columns: Vec<String>,
    /// Last period with observed data.
    pub last_observed: NaiveDate,
}

impl RouteForecast {
    pub fn rows_in(&self, segment: Segment) -> impl Iterator<Item = &ForecastRow> {
        self.rows.iter().filter(move |r| r.segment == segment)
    }

    pub fn future(&self) -> Vec<ForecastRow> {
        self.rows_in(Segment::Future).cloned().collect()
    }
}

/// Trains, evaluates and rolls forward one route.
pub struct RoutePipeline<'a> {
    dataset: &'a RouteDataset,
    config: &'a PipelineConfig,
    model: &'a ModelSpec,
}

impl<'a> RoutePipeline<'a> {
    pub fn new(dataset: &'a RouteDataset, config: &'a PipelineConfig, model: &'a ModelSpec) -> Self {
        Self {
            dataset,
            config,
            model,
        }
    }

    /// Fit on the training window, score Train and Test, refit on every
    /// period and roll `forecast_periods` periods forward.
    pub fn run(&self, origin: &str, destination: &str) -> Result<RouteForecast> {
        let granularity = self.config.granularity;
        let mut assembler = RouteSeriesAssembler::new(self.dataset, self.config);
        let prepared = assembler.prepare_data(origin, destination, self.config.test_size)?;

        let mut model = self.model.create();
        model.fit(&prepared.x_train, &prepared.y_train)?;
        let train_pred = model.predict(&prepared.x_train)?;
        let train_metrics = calculate_metrics(&prepared.y_train, &train_pred)?;

        let (test_pred, test_metrics) =
            if granularity != Granularity::Yearly && !prepared.x_test.is_empty() {
                let pred = model.predict(&prepared.x_test)?;
                let metrics = calculate_metrics(&prepared.y_test, &pred)?;
                (pred, Some(metrics))
            } else {
                (Vec::new(), None)
            };

        let mut rows = Vec::new();
        if self.config.include_history {
            let train = prepared.train_periods.iter().zip(&prepared.y_train).zip(&train_pred);
            for ((&period, &actual), &pred) in train {
                rows.push(ForecastRow::new(period, pred, Some(actual), Segment::Train));
            }
            let test = prepared.test_periods.iter().zip(&prepared.y_test).zip(&test_pred);
            for ((&period, &actual), &pred) in test {
                rows.push(ForecastRow::new(period, pred, Some(actual), Segment::Test));
            }
        }

        let mut full = RouteSeriesAssembler::new(self.dataset, self.config);
        let all = full.prepare_data(origin, destination, 0)?;
        let mut final_model = self.model.create();
        final_model.fit(&all.x_train, &all.y_train)?;
        let last_observed = all.filled.last_timestamp().ok_or(ForecastError::EmptyData)?;

        let (preprocessor, features) = full.into_components();
        let rolling = RollingForecaster::new(
            &preprocessor,
            &features,
            final_model.as_ref(),
            all.filled,
            all.feature_columns.clone(),
            granularity,
        )?;
        rows.extend(rolling.forecast(self.config.forecast_periods)?);

        info!(
            origin,
            destination,
            granularity = %granularity,
            model = self.model.name,
            train_mae = train_metrics.mae,
            test_mae = test_metrics.as_ref().map(|m| m.mae),
            "route forecast complete"
        );
        Ok(RouteForecast {
            origin: origin.to_string(),
            destination: destination.to_string(),
            granularity,
            model: self.model.name.to_string(),
            rows,
            train_metrics,
            test_metrics,
            feature_columns: all.feature_columns,
            last_observed,
        })
    }
}
