use thiserror::Error;

use crate::strategy::StrategyKind;

/// Bytes per buffer in the reference workload.
pub const BUFFER_LEN: usize = 200_001;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("unknown mode {0:?}, expected 1 (mmap) or 2 (malloc)")]
  UnknownMode(String),

  #[error("worker count must be at least 1")]
  NoWorkers,
}

/// Everything a run needs to know, passed in explicitly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChurnConfig {
  /// Backing system under test.
  pub strategy: StrategyKind,
  /// Bytes per buffer.
  pub buffer_len: usize,
  /// Buffers per churn cycle.
  pub batch_count: usize,
  /// Parallel drivers. `1` drives in the calling thread.
  pub worker_count: usize,
  /// Churn cycles per worker.
  pub iterations_per_worker: usize,
  /// Write every byte before shuffling.
  pub touch: bool,
}

impl ChurnConfig {
  /// One large, fully touched batch driven once from the calling thread.
  pub fn baseline(strategy: StrategyKind) -> Self {
    Self {
      strategy,
      buffer_len: BUFFER_LEN,
      batch_count: 10_000,
      worker_count: 1,
      iterations_per_worker: 1,
      touch: true,
    }
  }

  /// Four workers each driving a hundred 400-buffer batches.
  pub fn concurrent(strategy: StrategyKind) -> Self {
    Self {
      strategy,
      buffer_len: BUFFER_LEN,
      batch_count: 400,
      worker_count: 4,
      iterations_per_worker: 100,
      touch: false,
    }
  }

  pub fn with_buffer_len(
    mut self,
    buffer_len: usize,
  ) -> Self {
    self.buffer_len = buffer_len;
    self
  }

  pub fn with_batch_count(
    mut self,
    batch_count: usize,
  ) -> Self {
    self.batch_count = batch_count;
    self
  }

  pub fn with_workers(
    mut self,
    worker_count: usize,
    iterations_per_worker: usize,
  ) -> Self {
    self.worker_count = worker_count;
    self.iterations_per_worker = iterations_per_worker;
    self
  }

  pub fn with_touch(
    mut self,
    touch: bool,
  ) -> Self {
    self.touch = touch;
    self
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.worker_count == 0 {
      return Err(ConfigError::NoWorkers);
    }
    Ok(())
  }

  /// Churn cycles the whole run performs.
  pub fn total_drives(&self) -> usize {
    self.worker_count * self.iterations_per_worker
  }
}
