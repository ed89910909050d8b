//! Benchmarks for the forecasting strategies and the labelling engine.

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use seriescast::core::{calendar, TimeSeries};
use seriescast::engine::AnomalyClusterEngine;
use seriescast::models::{AdditiveTrendSeasonal, Forecaster, HoltWinters, SARIMA};
use seriescast::{ForecastRequest, Pipeline};

fn generate_monthly(n: usize) -> TimeSeries {
    let base = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
    let timestamps = (0..n)
        .map(|i| calendar::add_months(base, i as u32).unwrap())
        .collect();
    let values = (0..n)
        .map(|i| {
            0.3 + 0.002 * i as f64
                + 0.2 * (2.0 * std::f64::consts::PI * i as f64 / 12.0).sin()
                + 0.03 * ((i * 7919) % 13) as f64 / 13.0
        })
        .collect();
    TimeSeries::univariate(timestamps, values).unwrap()
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategies");

    for size in [36, 120, 360].iter() {
        let series = generate_monthly(*size);

        group.bench_with_input(BenchmarkId::new("SARIMA", size), size, |b, _| {
            b.iter(|| {
                let mut model = SARIMA::default();
                model.fit(black_box(&series)).unwrap();
                model.predict(12).unwrap()
            })
        });

        group.bench_with_input(BenchmarkId::new("Prophet", size), size, |b, _| {
            b.iter(|| {
                let mut model = AdditiveTrendSeasonal::default();
                model.fit(black_box(&series)).unwrap();
                model.predict(12).unwrap()
            })
        });

        group.bench_with_input(BenchmarkId::new("HoltWinters", size), size, |b, _| {
            b.iter(|| {
                let mut model = HoltWinters::default();
                model.fit(black_box(&series)).unwrap();
                model.predict(12).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_labels(c: &mut Criterion) {
    let mut group = c.benchmark_group("labels");
    let engine = AnomalyClusterEngine::default();

    for size in [36, 360, 3600].iter() {
        let series = generate_monthly(*size);
        group.bench_with_input(BenchmarkId::new("isolation_forest+kmeans", size), size, |b, _| {
            b.iter(|| engine.run(black_box(&series)))
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut csv = String::from("date,value\n");
    for i in 0..60 {
        csv.push_str(&format!(
            "{}-{:02}-01,{}\n",
            2015 + i / 12,
            i % 12 + 1,
            50.0 + i as f64 * 0.4 + 8.0 * ((i % 12) as f64 / 2.0).sin()
        ));
    }
    let pipeline = Pipeline::default();
    let request = ForecastRequest::new("value", 12);

    c.bench_function("pipeline_all_strategies", |b| {
        b.iter(|| pipeline.run_bytes(black_box(csv.as_bytes()), &request).unwrap())
    });
}

criterion_group!(benches, bench_strategies, bench_labels, bench_pipeline);
criterion_main!(benches);
