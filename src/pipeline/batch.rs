//! Cross-route batch runs with per-route failure isolation.

use crate::config::PipelineConfig;
use crate::error::{ForecastError, Result};
use crate::models::ModelSpec;
use crate::pipeline::dataset::RouteDataset;
use crate::pipeline::route::{RouteForecast, RoutePipeline};
use rayon::prelude::*;
use std::sync::Mutex;
use tracing::{info, warn};

/// Destination of finished route forecasts.
///
/// Called once per route with the complete result, possibly from several
/// worker threads at once.
pub trait ResultSink: Send + Sync {
    fn write_route(&self, forecast: &RouteForecast) -> Result<()>;
}

/// Sink collecting results in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    routes: Mutex<Vec<RouteForecast>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.routes.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collected results, sorted by route.
    pub fn into_results(self) -> Vec<RouteForecast> {
        let mut routes = self
            .routes
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        routes.sort_by(|a, b| (&a.origin, &a.destination).cmp(&(&b.origin, &b.destination)));
        routes
    }
}

impl ResultSink for MemorySink {
    fn write_route(&self, forecast: &RouteForecast) -> Result<()> {
        let mut routes = self
            .routes
            .lock()
            .map_err(|_| ForecastError::ComputationError("result sink lock poisoned".into()))?;
        routes.push(forecast.clone());
        Ok(())
    }
}

/// What happened to one route of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOutcome {
    pub origin: String,
    pub destination: String,
    /// Number of rows written, or the error that stopped the route.
    pub result: std::result::Result<usize, ForecastError>,
}

impl RouteOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs [`RoutePipeline`] over many routes in parallel.
pub struct BatchRunner<'a> {
    dataset: &'a RouteDataset,
    config: &'a PipelineConfig,
    model: &'a ModelSpec,
}

impl<'a> BatchRunner<'a> {
    pub fn new(dataset: &'a RouteDataset, config: &'a PipelineConfig, model: &'a ModelSpec) -> Self {
        Self {
            dataset,
            config,
            model,
        }
    }

    /// Forecast every route in the dataset.
    pub fn run_all(&self, sink: &dyn ResultSink) -> Vec<RouteOutcome> {
        self.run(&self.dataset.routes(), sink)
    }

    /// Forecast the given routes. A failing route is reported in its outcome
    /// and never stops the others.
    pub fn run(&self, routes: &[(String, String)], sink: &dyn ResultSink) -> Vec<RouteOutcome> {
        let outcomes: Vec<RouteOutcome> = routes
            .par_iter()
            .map(|(origin, destination)| {
                let result = RoutePipeline::new(self.dataset, self.config, self.model)
                    .run(origin, destination)
                    .and_then(|forecast| {
                        sink.write_route(&forecast)?;
                        Ok(forecast.rows.len())
                    });
                if let Err(e) = &result {
                    warn!(origin = %origin, destination = %destination, error = %e, "route failed");
                }
                RouteOutcome {
                    origin: origin.clone(),
                    destination: destination.clone(),
                    result,
                }
            })
            .collect();

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        info!(
            routes = outcomes.len(),
            failed,
            granularity = %self.config.granularity,
            "batch complete"
        );
        outcomes
    }
}
