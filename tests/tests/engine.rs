mod utils;
#[allow(unused)]
use utils::*;

use loadcell::prelude::*;
use mock_backend::{conn_config, MockConnector, MockProfile};
use std::sync::Arc;
use std::time::Duration;

async fn connect_seeded(connector: &MockConnector, database: &str, rows: u64) -> Arc<impl Backend> {
    let backend = connector
        .connect(&conn_config(database))
        .await
        .expect("mock connect");
    backend.seed(rows).await.expect("mock seed");
    Arc::new(backend)
}

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(60_000)]
async fn count_mode_end_to_end() {
    init();
    let connector = MockConnector::new(MockProfile::fixed(Duration::from_millis(5)));
    let backend = connect_seeded(&connector, "bench01", 1_000).await;

    let params = count_params(1_000, 10);
    let stats = run_workload(backend, &params, WorkloadMix::default(), "throughput").await;

    assert_eq!(stats.total, 1_000);
    assert_eq!(stats.errors, 0);

    // Every operation sleeps a fixed 5ms, so the whole latency
    // distribution sits just above it.
    assert!(stats.latency_p50 >= Duration::from_millis(5));
    assert!(stats.latency_p99 < Duration::from_millis(20), "p99={:?}", stats.latency_p99);
    assert!(stats.latency_min <= stats.latency_p50);
    assert!(stats.latency_p50 <= stats.latency_p99);

    // QPS is successful count over measured wall duration.
    let expected_qps = 1_000.0 / stats.duration.as_secs_f64();
    assert!((stats.qps - expected_qps).abs() / expected_qps < 0.01);
}

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(60_000)]
async fn duration_mode_respects_the_clock() {
    init();
    let connector = MockConnector::new(MockProfile::fixed(Duration::from_millis(1)));
    let backend = connect_seeded(&connector, "bench01", 1_000).await;

    let params = timed_params(Duration::from_millis(500), 4);
    let stats = run_workload(backend, &params, WorkloadMix::default(), "timed").await;

    assert!(stats.total > 0);
    assert!(stats.duration >= Duration::from_millis(500));
    // In-flight operations finish after the stop flag flips, so the
    // overrun is bounded by roughly one operation latency.
    assert!(
        stats.duration <= Duration::from_millis(550),
        "duration={:?}",
        stats.duration
    );
}

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(60_000)]
async fn operation_errors_are_counted_not_fatal() {
    init();
    let profile = MockProfile {
        error_rate: 1.0,
        mean_latency: Duration::from_micros(100),
        ..MockProfile::default()
    };
    let connector = MockConnector::new(profile);
    let backend = Arc::new(
        connector
            .connect(&conn_config("bench01"))
            .await
            .expect("mock connect"),
    );

    let stats = run_workload(backend, &count_params(200, 4), WorkloadMix::default(), "errs").await;
    assert_eq!(stats.total, 200);
    assert_eq!(stats.errors, 200);
    assert_eq!(stats.qps, 0.0);
    assert_eq!(stats.latency_p99, Duration::ZERO);
}

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(60_000)]
async fn median_of_three_runs() {
    init();
    let connector = MockConnector::new(MockProfile::fixed(Duration::from_millis(1)));
    let backend = connect_seeded(&connector, "bench01", 1_000).await;

    let params = count_params(200, 10);
    let config = MultiRunConfig {
        cooldown: Duration::ZERO,
        ..MultiRunConfig::default()
    };

    let report = run_multiple(3, config, "repeated", |_run| {
        let backend = backend.clone();
        let params = params.clone();
        async move { run_workload(backend, &params, WorkloadMix::default(), "repeated").await }
    })
    .await;

    assert_eq!(report.runs.len(), 3);
    assert_eq!(report.stats.label, "repeated (median of 3 runs)");
    assert_eq!(report.stats.total, 200);
    // The median run's p50 must be one of the observed p50s.
    assert!(report
        .runs
        .iter()
        .any(|r| r.latency_p50 == report.stats.latency_p50));
}
