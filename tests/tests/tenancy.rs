mod utils;
#[allow(unused)]
use utils::*;

use loadcell::prelude::*;
use loadcell::Error;
use mock_backend::{conn_config, MockConnector, MockProfile};
use std::time::Duration;

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(120_000)]
async fn fan_out_flags_a_slow_tenant() {
    init();
    let connector = MockConnector::new(MockProfile::fixed(Duration::from_millis(1)));
    // bench10 is an order of magnitude slower than its neighbors.
    connector.set_profile("bench10", MockProfile::fixed(Duration::from_millis(10)));

    let names = tenant_names(10);
    let params = count_params(600, 10);
    let report = run_fan_out(
        &connector,
        &conn_config("bench01"),
        &names,
        &params,
        FanOutConfig::default(),
    )
    .await
    .expect("fan-out");

    assert_eq!(report.tenants.len(), 10);
    // Tenants are ranked slowest-first.
    assert_eq!(report.tenants[0].tenant, "bench10");
    assert!(report.slowest_p50 > report.fastest_p50);
    assert!(report.ratio >= 3.0, "ratio={:.2}", report.ratio);
    assert_ne!(report.verdict, FairnessVerdict::Fair);

    // The merged stats cover every tenant's samples.
    let tenant_total: usize = report.tenants.iter().map(|t| t.stats.total).sum();
    assert_eq!(report.overall.total, tenant_total);
    assert_eq!(report.overall.errors, 0);
}

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(60_000)]
async fn fan_out_fails_fast_on_bad_tenant() {
    init();
    let connector = MockConnector::new(MockProfile::fixed(Duration::from_millis(1)));
    connector.refuse("bench03");

    let err = run_fan_out(
        &connector,
        &conn_config("bench01"),
        &tenant_names(5),
        &count_params(100, 5),
        FanOutConfig::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Connect { ref tenant, .. } if tenant == "bench03"));
}

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(120_000)]
async fn noisy_neighbors_degrade_the_victim() {
    init();
    // Every concurrent in-flight operation anywhere in the cluster
    // costs everyone an extra 500us.
    let connector = MockConnector::with_contention(
        MockProfile::fixed(Duration::from_millis(1)),
        Duration::from_micros(500),
    );

    let config = IsolationConfig {
        ramp_up: Duration::from_millis(100),
        ..IsolationConfig::default()
    };
    let report = run_isolation(
        &connector,
        &conn_config("bench01"),
        "bench01",
        &tenant_names_from(2, 3),
        &count_params(200, 5),
        config,
    )
    .await
    .expect("isolation");

    assert_eq!(report.noise_tenants, 3);
    assert_eq!(report.noise_workers_total, 15);
    assert!(report.under_noise.latency_p50 > report.baseline.latency_p50);
    assert!(report.impact > 0.2, "impact={:.2}", report.impact);
    assert_ne!(report.verdict, IsolationVerdict::Isolated);
}

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(120_000)]
async fn contention_free_cluster_is_isolated() {
    init();
    // No cross-tenant contention model: noise cannot reach the victim,
    // and the 20ms base latency dwarfs scheduling jitter.
    let connector = MockConnector::new(MockProfile::fixed(Duration::from_millis(20)));

    let config = IsolationConfig {
        ramp_up: Duration::from_millis(100),
        ..IsolationConfig::default()
    };
    let report = run_isolation(
        &connector,
        &conn_config("bench01"),
        "bench01",
        &tenant_names_from(2, 3),
        &count_params(50, 5),
        config,
    )
    .await
    .expect("isolation");

    assert!(
        report.impact.abs() < 0.2,
        "impact={:.2} baseline={:?} noise={:?}",
        report.impact,
        report.baseline.latency_p50,
        report.under_noise.latency_p50
    );
    assert_eq!(report.verdict, IsolationVerdict::Isolated);
}

fn tenant_names_from(start: usize, count: usize) -> Vec<String> {
    (start..start + count).map(|i| format!("bench{i:02}")).collect()
}
