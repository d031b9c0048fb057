use std::time::{Duration, Instant};

use tracing::{debug, info, info_span};

use crate::{
  churn::Churn,
  config::ChurnConfig,
  error::ChurnError,
  pool::WorkerPool,
  strategy::{Heap, Mmap, Strategy, StrategyKind},
  tracked::{AllocStats, Tracked},
};

/// What a finished run did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunReport {
  pub strategy: StrategyKind,
  pub completed: usize,
  pub elapsed: Duration,
  pub stats: AllocStats,
}

/// Runs the configured workload against the selected backing system.
///
/// A single worker drives in the calling thread; more than one goes through
/// a [`WorkerPool`].
pub fn run(config: &ChurnConfig) -> Result<RunReport, ChurnError> {
  config.validate()?;

  let span = info_span!("run", strategy = config.strategy.name());
  let _enter = span.enter();

  match config.strategy {
    StrategyKind::Mmap => run_with(config, Mmap),
    StrategyKind::Heap => run_with(config, Heap),
  }
}

fn run_with<S: Strategy>(
  config: &ChurnConfig,
  strategy: S,
) -> Result<RunReport, ChurnError> {
  let tracked = Tracked::new(strategy);
  let churn = Churn::new(&tracked, config.buffer_len).with_touch(config.touch);
  let started = Instant::now();

  info!(
    buffer_len = config.buffer_len,
    batch_count = config.batch_count,
    workers = config.worker_count,
    iterations = config.iterations_per_worker,
    touch = config.touch,
    "starting churn"
  );

  let completed = if config.worker_count == 1 {
    for iteration in 0..config.iterations_per_worker {
      churn.drive(config.batch_count)?;
      debug!(iteration, "drive finished");
    }
    config.iterations_per_worker
  } else {
    WorkerPool::new(config.worker_count, config.iterations_per_worker)
      .run(&churn, config.batch_count)?
      .completed
  };

  let stats = tracked.stats();
  debug_assert!(stats.is_balanced(), "blocks leaked: {stats:?}");

  let report = RunReport {
    strategy: config.strategy,
    completed,
    elapsed: started.elapsed(),
    stats,
  };
  info!(
    completed = report.completed,
    acquires = stats.acquires,
    releases = stats.releases,
    bytes_acquired = stats.bytes_acquired,
    elapsed_ms = report.elapsed.as_millis() as u64,
    "churn finished"
  );

  Ok(report)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ConfigError;

  fn small(strategy: StrategyKind) -> ChurnConfig {
    ChurnConfig::concurrent(strategy)
      .with_buffer_len(4096)
      .with_batch_count(10)
  }

  #[test]
  fn test_single_threaded_mmap() {
    let config = small(StrategyKind::Mmap).with_workers(1, 3).with_touch(true);

    let report = run(&config).unwrap();

    assert_eq!(report.strategy, StrategyKind::Mmap);
    assert_eq!(report.completed, 3);
    assert_eq!(report.stats.acquires, 3 * 15);
    assert!(report.stats.is_balanced());
  }

  #[test]
  fn test_concurrent_heap() {
    let config = small(StrategyKind::Heap).with_workers(4, 5);

    let report = run(&config).unwrap();

    assert_eq!(report.completed, 20);
    assert_eq!(report.stats.acquires, 20 * 15);
    assert_eq!(report.stats.bytes_acquired, 20 * 15 * 4096);
    assert!(report.stats.is_balanced());
  }

  #[test]
  fn test_invalid_config_is_rejected() {
    let config = small(StrategyKind::Heap).with_workers(0, 5);

    let err = run(&config).unwrap_err();

    assert!(matches!(err, ChurnError::Config(ConfigError::NoWorkers)));
  }
}
