use std::{
  sync::atomic::{AtomicUsize, Ordering},
  thread,
  time::{Duration, Instant},
};

use tracing::{error, info};

use crate::{churn::Churn, error::ChurnError, strategy::Strategy};

/// Outcome of a [`WorkerPool::run`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolReport {
  pub workers: usize,
  pub completed: usize,
  pub elapsed: Duration,
}

/// Runs the same churn workload on several threads at once.
///
/// Workers share nothing but the strategy's backing system. They are not
/// synchronised with each other; the only blocking point is the join at the
/// end of [`WorkerPool::run`].
#[derive(Clone, Copy, Debug)]
pub struct WorkerPool {
  workers: usize,
  iterations: usize,
}

impl WorkerPool {
  pub fn new(
    workers: usize,
    iterations: usize,
  ) -> Self {
    Self {
      workers,
      iterations,
    }
  }

  pub fn workers(&self) -> usize {
    self.workers
  }

  pub fn iterations(&self) -> usize {
    self.iterations
  }

  /// Spawns the workers, each driving `iterations` cycles of `count` buffers,
  /// and waits for all of them.
  ///
  /// The first failure (spawn, allocation or panic) is returned once every
  /// worker that did start has been joined.
  pub fn run<S: Strategy>(
    &self,
    churn: &Churn<'_, S>,
    count: usize,
  ) -> Result<PoolReport, ChurnError> {
    let completed = AtomicUsize::new(0);
    let started = Instant::now();

    let outcome = thread::scope(|scope| {
      let mut handles = Vec::with_capacity(self.workers);
      let mut failure = None;

      for worker in 0..self.workers {
        let completed = &completed;
        let spawned = thread::Builder::new()
          .name(format!("churn-worker-{worker}"))
          .spawn_scoped(scope, move || -> Result<(), ChurnError> {
            for _ in 0..self.iterations {
              churn.drive(count)?;
              completed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(())
          });

        match spawned {
          Ok(handle) => handles.push((worker, handle)),
          Err(source) => {
            error!(worker, %source, "failed to spawn worker");
            failure = Some(ChurnError::Spawn { worker, source });
            break;
          }
        }
      }

      for (worker, handle) in handles {
        let result = match handle.join() {
          Ok(result) => result,
          Err(_) => Err(ChurnError::WorkerPanicked { worker }),
        };

        if let Err(err) = result {
          error!(worker, %err, "worker failed");
          failure.get_or_insert(err);
        }
      }

      match failure {
        Some(err) => Err(err),
        None => Ok(()),
      }
    });
    outcome?;

    let report = PoolReport {
      workers: self.workers,
      completed: completed.load(Ordering::Relaxed),
      elapsed: started.elapsed(),
    };
    info!(
      strategy = churn.strategy().name(),
      workers = report.workers,
      completed = report.completed,
      elapsed_ms = report.elapsed.as_millis() as u64,
      "worker pool finished"
    );

    Ok(report)
  }
}
