//! Counting wrapper around any [`Strategy`].
//!
//! All counters use `Relaxed` ordering. A snapshot taken while other threads
//! are still churning may be transiently inconsistent across counters; one
//! taken after every worker has been joined is exact.

use std::{
  ptr::NonNull,
  sync::atomic::{AtomicUsize, Ordering},
};

use crate::strategy::{AllocError, Strategy, byte_len};

/// Point-in-time view of a [`Tracked`] strategy's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocStats {
  pub acquires: usize,
  pub releases: usize,
  pub failures: usize,
  pub bytes_acquired: usize,
  pub footprint_outstanding: usize,
}

impl AllocStats {
  /// Blocks acquired and not yet released.
  pub fn outstanding(&self) -> usize {
    self.acquires.saturating_sub(self.releases)
  }

  pub fn is_balanced(&self) -> bool {
    self.acquires == self.releases && self.footprint_outstanding == 0
  }
}

/// A strategy that counts every acquire and release it forwards.
#[derive(Debug, Default)]
pub struct Tracked<S> {
  inner: S,
  acquires: AtomicUsize,
  releases: AtomicUsize,
  failures: AtomicUsize,
  bytes_acquired: AtomicUsize,
  footprint_outstanding: AtomicUsize,
}

impl<S: Strategy> Tracked<S> {
  pub fn new(inner: S) -> Self {
    Self {
      inner,
      acquires: AtomicUsize::new(0),
      releases: AtomicUsize::new(0),
      failures: AtomicUsize::new(0),
      bytes_acquired: AtomicUsize::new(0),
      footprint_outstanding: AtomicUsize::new(0),
    }
  }

  pub fn inner(&self) -> &S {
    &self.inner
  }

  pub fn stats(&self) -> AllocStats {
    AllocStats {
      acquires: self.acquires.load(Ordering::Relaxed),
      releases: self.releases.load(Ordering::Relaxed),
      failures: self.failures.load(Ordering::Relaxed),
      bytes_acquired: self.bytes_acquired.load(Ordering::Relaxed),
      footprint_outstanding: self.footprint_outstanding.load(Ordering::Relaxed),
    }
  }
}

impl<S: Strategy> Strategy for Tracked<S> {
  fn name(&self) -> &'static str {
    self.inner.name()
  }

  fn footprint(
    &self,
    bytes: usize,
  ) -> usize {
    self.inner.footprint(bytes)
  }

  fn acquire<T: Copy>(
    &self,
    n: usize,
  ) -> Result<NonNull<T>, AllocError> {
    match self.inner.acquire::<T>(n) {
      Ok(block) => {
        // acquire succeeded, so the byte length cannot overflow
        let bytes = byte_len::<T>(n).unwrap_or(0);
        self.acquires.fetch_add(1, Ordering::Relaxed);
        self.bytes_acquired.fetch_add(bytes, Ordering::Relaxed);
        self
          .footprint_outstanding
          .fetch_add(self.inner.footprint(bytes), Ordering::Relaxed);
        Ok(block)
      }
      Err(err) => {
        self.failures.fetch_add(1, Ordering::Relaxed);
        Err(err)
      }
    }
  }

  unsafe fn release<T: Copy>(
    &self,
    block: NonNull<T>,
    n: usize,
  ) {
    let bytes = byte_len::<T>(n).unwrap_or(0);

    // SAFETY: forwarded unchanged from our caller.
    unsafe { self.inner.release(block, n) };

    self.releases.fetch_add(1, Ordering::Relaxed);
    self
      .footprint_outstanding
      .fetch_sub(self.inner.footprint(bytes), Ordering::Relaxed);
  }
}
