//! Route pipeline: dataset access, series assembly, rolling forecast and batch runs.

pub mod assembler;
pub mod batch;
pub mod dataset;
pub mod rolling;
pub mod route;

pub use assembler::{effective_test_size, PreparedData, RouteSeriesAssembler};
pub use batch::{BatchRunner, MemorySink, ResultSink, RouteOutcome};
pub use dataset::{RawRecord, RouteDataset};
pub use rolling::RollingForecaster;
pub use route::{RouteForecast, RoutePipeline};
