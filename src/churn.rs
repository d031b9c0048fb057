//! The churn cycle.
//!
//! ```text
//!   allocate   [A0 A1 A2 A3 A4 A5]        count buffers, in order
//!   touch      [A0 A1 A2 A3 A4 A5]        every byte := SENTINEL
//!   shuffle    [A3 A0 A5 A1 A4 A2]        uniform permutation
//!   release    [·· ·· ·· A1 A4 A2]        first count/2 dropped in order
//!   replace    [B0 B1 B2 A1 A4 A2]        count/2 fresh buffers at the front
//!   release    [·· ·· ·· ·· ·· ··]        everything, front to back
//! ```

use rand::{Rng, seq::SliceRandom};
use tracing::{debug, trace};

use crate::{
  buffer::Buffer,
  strategy::{AllocError, Strategy},
};

/// Byte written into every element during the touch phase.
pub const SENTINEL: u8 = 99;

/// An ordered set of buffers driven through one churn cycle.
///
/// The batch is the sole owner of its buffers. Dropping it (including on an
/// error path) releases whatever it still holds.
#[derive(Debug)]
pub struct Batch<'s, S: Strategy> {
  strategy: &'s S,
  buffer_len: usize,
  buffers: Vec<Buffer<'s, S>>,
}

impl<'s, S: Strategy> Batch<'s, S> {
  /// Acquires `count` buffers of `buffer_len` bytes.
  ///
  /// If any acquire fails the buffers already obtained are released before
  /// the error is returned.
  pub fn allocate(
    strategy: &'s S,
    buffer_len: usize,
    count: usize,
  ) -> Result<Self, AllocError> {
    let buffers = (0..count)
      .map(|_| Buffer::new(strategy, buffer_len))
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Self {
      strategy,
      buffer_len,
      buffers,
    })
  }

  pub fn len(&self) -> usize {
    self.buffers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.buffers.is_empty()
  }

  pub fn buffers(&self) -> &[Buffer<'s, S>] {
    &self.buffers
  }

  /// Block addresses in current order.
  pub fn ids(&self) -> Vec<usize> {
    self.buffers.iter().map(Buffer::id).collect()
  }

  pub fn touch(
    &mut self,
    value: u8,
  ) {
    for buffer in &mut self.buffers {
      buffer.fill(value);
    }
  }

  pub fn shuffle<R: Rng + ?Sized>(
    &mut self,
    rng: &mut R,
  ) {
    self.buffers.shuffle(rng);
  }

  /// Releases the first `len / 2` buffers in order, then acquires as many
  /// fresh ones and puts them where the released ones were.
  pub fn replace_front_half(&mut self) -> Result<(), AllocError> {
    let half = self.buffers.len() / 2;

    for released in self.buffers.drain(..half) {
      drop(released);
    }

    let fresh = (0..half)
      .map(|_| Buffer::new(self.strategy, self.buffer_len))
      .collect::<Result<Vec<_>, _>>()?;
    self.buffers.splice(0..0, fresh);

    Ok(())
  }

  /// Releases every buffer, front to back.
  pub fn release_all(mut self) {
    for released in self.buffers.drain(..) {
      drop(released);
    }
  }
}

/// Drives churn cycles against one strategy.
#[derive(Debug)]
pub struct Churn<'s, S: Strategy> {
  strategy: &'s S,
  buffer_len: usize,
  touch: bool,
}

impl<'s, S: Strategy> Churn<'s, S> {
  pub fn new(
    strategy: &'s S,
    buffer_len: usize,
  ) -> Self {
    Self {
      strategy,
      buffer_len,
      touch: false,
    }
  }

  /// Enables or disables the touch phase.
  pub fn with_touch(
    mut self,
    touch: bool,
  ) -> Self {
    self.touch = touch;
    self
  }

  pub fn strategy(&self) -> &'s S {
    self.strategy
  }

  pub fn buffer_len(&self) -> usize {
    self.buffer_len
  }

  /// Runs one cycle over `count` buffers with the thread-local RNG.
  pub fn drive(
    &self,
    count: usize,
  ) -> Result<(), AllocError> {
    self.drive_with(count, &mut rand::rng())
  }

  /// Runs one cycle over `count` buffers, shuffling with `rng`.
  pub fn drive_with<R: Rng + ?Sized>(
    &self,
    count: usize,
    rng: &mut R,
  ) -> Result<(), AllocError> {
    if count == 0 {
      return Ok(());
    }

    let mut batch = Batch::allocate(self.strategy, self.buffer_len, count)?;
    trace!(count, strategy = self.strategy.name(), "batch allocated");

    if self.touch {
      batch.touch(SENTINEL);
      trace!(count, "batch touched");
    }

    batch.shuffle(rng);
    batch.replace_front_half()?;
    trace!(replaced = count / 2, "front half replaced");

    batch.release_all();
    debug!(count, strategy = self.strategy.name(), "churn cycle complete");

    Ok(())
  }
}
