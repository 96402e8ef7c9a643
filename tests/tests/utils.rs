use std::sync::OnceLock;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use loadcell_core::BenchParams;

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();
    ONCE_LOCK.get_or_init(|| {
        let _ = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .try_init();
    });
}

#[allow(unused)]
pub fn count_params(operation_count: usize, concurrency: usize) -> BenchParams {
    BenchParams {
        operation_count,
        concurrency,
        warmup_count: 0,
        keyspace_size: 1_000,
        run_duration: None,
        run_repetitions: 1,
    }
}

#[allow(unused)]
pub fn timed_params(duration: Duration, concurrency: usize) -> BenchParams {
    BenchParams {
        run_duration: Some(duration),
        concurrency,
        warmup_count: 0,
        keyspace_size: 1_000,
        ..BenchParams::default()
    }
}

#[allow(unused)]
pub fn tenant_names(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("bench{i:02}")).collect()
}
