use std::io;

use thiserror::Error;

use crate::{config::ConfigError, strategy::AllocError};

/// Why a run stopped. Every variant is fatal to the run.
#[derive(Debug, Error)]
pub enum ChurnError {
  #[error(transparent)]
  Alloc(#[from] AllocError),

  #[error("invalid configuration: {0}")]
  Config(#[from] ConfigError),

  #[error("failed to spawn worker {worker}")]
  Spawn {
    worker: usize,
    #[source]
    source: io::Error,
  },

  #[error("worker {worker} panicked")]
  WorkerPanicked { worker: usize },
}
