//! Benchmarks for the rolling route forecast and reconciliation.

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use route_forecast::config::{FeatureConfig, PipelineConfig};
use route_forecast::core::period::shift_months;
use route_forecast::core::{ForecastRow, Granularity};
use route_forecast::models::{ModelSpec, RidgeRegression, TimeModelKind};
use route_forecast::pipeline::{RawRecord, RouteDataset, RoutePipeline};
use route_forecast::reconcile::{ReconcileMethod, ReconciliationEngine};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
}

fn generate_route(months: usize) -> RouteDataset {
    let columns = vec![
        "Route_Total_Seats".to_string(),
        "Avg Fare (USD)".to_string(),
        "O_GDP".to_string(),
    ];
    let records = (0..months)
        .map(|i| {
            let t = i as f64;
            let seats = 4000.0 + 12.0 * t + 300.0 * (2.0 * std::f64::consts::PI * t / 12.0).sin();
            RawRecord::new(
                shift_months(start(), i as i32).unwrap(),
                "CAN",
                "PEK",
                vec![seats, 250.0 + (t * 0.7).cos() * 5.0, 1000.0 + 4.0 * t],
            )
        })
        .collect();
    RouteDataset::from_records(columns, records).unwrap()
}

fn bench_rolling_forecast(c: &mut Criterion) {
    let mut group = c.benchmark_group("rolling_forecast");
    group.sample_size(20);

    let data = generate_route(96);
    let spec = ModelSpec::new("Ridge", || Box::new(RidgeRegression::new(1.0)));

    for periods in [6usize, 12, 24].iter() {
        let mut config = PipelineConfig::new(Granularity::Monthly).with_forecast_periods(*periods);
        config.assembler.excluded_months.clear();
        config.preprocessor = config.preprocessor.with_tail_model(TimeModelKind::Linear);
        config.features = FeatureConfig {
            ts_model: TimeModelKind::Holt,
            ..FeatureConfig::default()
        };

        group.bench_with_input(BenchmarkId::new("monthly_ridge", periods), periods, |b, _| {
            let pipeline = RoutePipeline::new(&data, &config, &spec);
            b.iter(|| pipeline.run(black_box("CAN"), black_box("PEK")))
        });
    }

    group.finish();
}

fn bench_reconciliation(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconciliation");

    for months in [12usize, 36, 120].iter() {
        let fine: Vec<ForecastRow> = (0..*months)
            .map(|i| ForecastRow::future(shift_months(start(), i as i32).unwrap(), 100.0 + i as f64))
            .collect();
        let coarse: Vec<ForecastRow> = (0..*months / 3)
            .map(|q| ForecastRow::future(shift_months(start(), 3 * q as i32).unwrap(), 330.0 + q as f64))
            .collect();

        for method in [ReconcileMethod::Linear, ReconcileMethod::Mint] {
            let engine = ReconciliationEngine::new(method, Granularity::Quarterly);
            group.bench_with_input(
                BenchmarkId::new(method.to_string(), months),
                months,
                |b, _| b.iter(|| engine.reconcile(black_box(&fine), black_box(&coarse))),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_rolling_forecast, bench_reconciliation);
criterion_main!(benches);
