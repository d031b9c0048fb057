//! # mapchurn - Allocation Strategy Churn Harness
//!
//! This crate puts two ways of getting large, short-lived buffers side by side
//! and churns them: fresh anonymous mappings straight from the kernel
//! (`mmap(2)` / `munmap(2)`), and blocks from the process heap
//! (`malloc(3)` / `free(3)`).
//!
//! ## Overview
//!
//! ```text
//!   Strategies:
//!
//!   ┌────────────────────────────┐      ┌────────────────────────────┐
//!   │           Mmap             │      │           Heap             │
//!   │                            │      │                            │
//!   │  acquire ──► mmap(2)       │      │  acquire ──► malloc(3)     │
//!   │  release ──► munmap(2)     │      │  release ──► free(3)       │
//!   │                            │      │                            │
//!   │  one syscall per request   │      │  reuses heap free space    │
//!   │  page granular, no reuse   │      │  fragmentation sensitive   │
//!   └────────────────────────────┘      └────────────────────────────┘
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   mapchurn
//!   ├── align      - align_to! rounding macro
//!   ├── strategy   - Strategy trait, Mmap, Heap, StrategyKind
//!   ├── tracked    - Tracked<S> counting wrapper, AllocStats
//!   ├── buffer     - Buffer: one owned fixed-size block
//!   ├── churn      - Batch and the Churn driver
//!   ├── pool       - WorkerPool: N threads churning at once
//!   ├── config     - ChurnConfig presets
//!   └── harness    - run(): strategy dispatch, serial or pooled
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use mapchurn::{Churn, Mmap, Tracked, WorkerPool};
//!
//! let strategy = Tracked::new(Mmap);
//! let churn = Churn::new(&strategy, 200_001).with_touch(true);
//!
//! // One cycle of 16 buffers in this thread...
//! churn.drive(16).unwrap();
//!
//! // ...then two workers doing three cycles each.
//! let report = WorkerPool::new(2, 3).run(&churn, 16).unwrap();
//! assert_eq!(report.completed, 6);
//!
//! assert!(strategy.stats().is_balanced());
//! ```
//!
//! ## The Churn Cycle
//!
//! ```text
//!   1. allocate   count buffers
//!   2. touch      write 99 into every byte (optional)
//!   3. shuffle    random permutation, decorrelating release order
//!   4. release    the first count/2
//!   5. replace    count/2 fresh buffers in their place
//!   6. release    everything
//!
//!   acquires = releases = count + count/2
//! ```
//!
//! ## Limitations
//!
//! - **Unix-only**: both strategies call into `libc`.
//! - **Plain data only**: storage is never constructed or destroyed, so the
//!   element type must be `Copy`.
//! - **No cancellation**: a worker always runs its iterations to completion.
//!
//! ## Safety
//!
//! [`Strategy::release`] is `unsafe`: it must receive exactly the block and
//! length a prior `acquire` on the same strategy returned. [`Buffer`] upholds
//! this by releasing in `Drop`, so code built on buffers and batches never
//! calls it directly.

pub mod align;
mod buffer;
mod churn;
mod config;
mod error;
pub mod harness;
mod pool;
mod strategy;
mod tracked;

pub use buffer::Buffer;
pub use churn::{Batch, Churn, SENTINEL};
pub use config::{BUFFER_LEN, ChurnConfig, ConfigError};
pub use error::ChurnError;
pub use harness::{RunReport, run};
pub use pool::{PoolReport, WorkerPool};
pub use strategy::{AllocError, Heap, Mmap, Strategy, StrategyKind};
pub use tracked::{AllocStats, Tracked};
