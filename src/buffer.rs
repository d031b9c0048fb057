use std::{ptr::NonNull, slice};

use crate::strategy::{AllocError, Strategy};

/// One fixed-size byte block owned for the lifetime of a batch.
///
/// The block is released back to its strategy exactly once, when the buffer
/// is dropped. No initialisation happens on construction, so the contents are
/// unreadable until the first [`Buffer::fill`].
pub struct Buffer<'s, S: Strategy> {
  strategy: &'s S,
  block: NonNull<u8>,
  len: usize,
  filled: bool,
}

impl<'s, S: Strategy> Buffer<'s, S> {
  pub fn new(
    strategy: &'s S,
    len: usize,
  ) -> Result<Self, AllocError> {
    let block = strategy.acquire::<u8>(len)?;

    Ok(Self {
      strategy,
      block,
      len,
      filled: false,
    })
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// Address of the underlying block. Distinct for every live non-empty
  /// buffer.
  pub fn id(&self) -> usize {
    self.block.as_ptr() as usize
  }

  /// Writes `value` into every byte, forcing the backing pages to be
  /// materialised.
  pub fn fill(
    &mut self,
    value: u8,
  ) {
    // SAFETY: `block` is valid for `len` writable bytes until drop.
    unsafe { self.block.as_ptr().write_bytes(value, self.len) };
    self.filled = true;
  }

  /// The contents, once they have been written by [`Buffer::fill`].
  pub fn as_slice(&self) -> Option<&[u8]> {
    if !self.filled {
      return None;
    }

    // SAFETY: every byte was initialised by `fill`.
    Some(unsafe { slice::from_raw_parts(self.block.as_ptr(), self.len) })
  }
}

impl<S: Strategy> Drop for Buffer<'_, S> {
  fn drop(&mut self) {
    // SAFETY: `block`/`len` are the pair `acquire` handed back in `new`, and
    // drop runs once.
    unsafe { self.strategy.release(self.block, self.len) };
  }
}

impl<S: Strategy> std::fmt::Debug for Buffer<'_, S> {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    f.debug_struct("Buffer")
      .field("strategy", &self.strategy.name())
      .field("block", &self.block)
      .field("len", &self.len)
      .field("filled", &self.filled)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    strategy::{Heap, Mmap},
    tracked::Tracked,
  };

  #[test]
  fn test_fill_then_read() {
    let mut buffer = Buffer::new(&Heap, 200_001).unwrap();

    assert_eq!(buffer.len(), 200_001);
    assert!(buffer.as_slice().is_none());

    buffer.fill(99);

    let contents = buffer.as_slice().unwrap();
    assert_eq!(contents.len(), 200_001);
    assert!(contents.iter().all(|&b| b == 99));
  }

  #[test]
  fn test_drop_releases_once() {
    let tracked = Tracked::new(Mmap);

    {
      let mut first = Buffer::new(&tracked, 4096).unwrap();
      let second = Buffer::new(&tracked, 4096).unwrap();
      first.fill(1);

      assert_ne!(first.id(), second.id());
      assert_eq!(tracked.stats().outstanding(), 2);
    }

    let stats = tracked.stats();
    assert_eq!(stats.acquires, 2);
    assert_eq!(stats.releases, 2);
    assert!(stats.is_balanced());
  }

  #[test]
  fn test_empty_buffer() {
    let tracked = Tracked::new(Heap);
    let mut buffer = Buffer::new(&tracked, 0).unwrap();

    assert!(buffer.is_empty());
    buffer.fill(7);
    assert_eq!(buffer.as_slice(), Some(&[][..]));

    drop(buffer);
    assert!(tracked.stats().is_balanced());
  }
}
