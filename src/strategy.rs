use std::{fmt, io, mem, ptr::NonNull, str::FromStr};

use libc::{MAP_ANON, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE, c_int, c_void};
use thiserror::Error;

use crate::{align_to, config::ConfigError};

// OpenBSD's exec-protection checks look for MAP_STACK on anonymous
// mappings. Targets without the flag get 0.
#[cfg(any(
  target_os = "linux",
  target_os = "android",
  target_os = "openbsd",
  target_os = "freebsd"
))]
const MAP_STACK: c_int = libc::MAP_STACK;

#[cfg(not(any(
  target_os = "linux",
  target_os = "android",
  target_os = "openbsd",
  target_os = "freebsd"
)))]
const MAP_STACK: c_int = 0;

#[derive(Debug, Error)]
pub enum AllocError {
  #[error("{strategy}: out of memory requesting {bytes} bytes")]
  OutOfMemory {
    strategy: &'static str,
    bytes: usize,
    #[source]
    source: io::Error,
  },

  #[error("{n} elements of {elem_size} bytes overflow the address space")]
  CapacityOverflow { n: usize, elem_size: usize },
}

/// A stateless source of raw storage.
///
/// Implementations hand out uninitialised storage for `n` elements of a
/// plain-data type and take it back again. The `Copy` bound on the element
/// type is what keeps construction out of the picture: a `Copy` type has no
/// `Drop`, so nothing needs to run when storage is acquired or released.
///
/// The backing system behind every implementation must be safe to call from
/// several threads at once, hence the `Sync` bound.
pub trait Strategy: Sync {
  /// Short name used in logs and errors.
  fn name(&self) -> &'static str;

  /// Bytes the backing system really commits for a request of `bytes`.
  fn footprint(
    &self,
    bytes: usize,
  ) -> usize {
    bytes
  }

  /// Requests storage for `n` elements of `T`.
  ///
  /// `n == 0` never reaches the backing system and yields a dangling,
  /// well-aligned pointer.
  fn acquire<T: Copy>(
    &self,
    n: usize,
  ) -> Result<NonNull<T>, AllocError>;

  /// Returns storage to the backing system.
  ///
  /// # Safety
  ///
  /// `block` and `n` must be exactly the pair returned by a prior successful
  /// [`Strategy::acquire`] on this same strategy, and the block must not have
  /// been released already.
  unsafe fn release<T: Copy>(
    &self,
    block: NonNull<T>,
    n: usize,
  );
}

pub(crate) fn byte_len<T>(n: usize) -> Result<usize, AllocError> {
  n.checked_mul(mem::size_of::<T>())
    .ok_or(AllocError::CapacityOverflow {
      n,
      elem_size: mem::size_of::<T>(),
    })
}

/// Asks the kernel for a fresh anonymous mapping on every acquire and unmaps
/// it on release.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Mmap;

impl Mmap {
  pub fn page_size() -> usize {
    // SAFETY: sysconf has no preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 { size as usize } else { 4096 }
  }
}

impl Strategy for Mmap {
  fn name(&self) -> &'static str {
    "mmap"
  }

  fn footprint(
    &self,
    bytes: usize,
  ) -> usize {
    align_to!(bytes, Self::page_size())
  }

  fn acquire<T: Copy>(
    &self,
    n: usize,
  ) -> Result<NonNull<T>, AllocError> {
    let bytes = byte_len::<T>(n)?;
    if bytes == 0 {
      return Ok(NonNull::dangling());
    }

    // SAFETY: anonymous private mapping with no fixed address.
    let addr = unsafe {
      libc::mmap(
        std::ptr::null_mut(),
        bytes,
        PROT_READ | PROT_WRITE,
        MAP_PRIVATE | MAP_ANON | MAP_STACK,
        -1,
        0,
      )
    };

    if addr == MAP_FAILED {
      return Err(AllocError::OutOfMemory {
        strategy: self.name(),
        bytes,
        source: io::Error::last_os_error(),
      });
    }

    NonNull::new(addr.cast::<T>()).ok_or_else(|| AllocError::OutOfMemory {
      strategy: self.name(),
      bytes,
      source: io::Error::other("mmap returned null"),
    })
  }

  unsafe fn release<T: Copy>(
    &self,
    block: NonNull<T>,
    n: usize,
  ) {
    // a pair from `acquire` never overflows
    let Ok(bytes) = byte_len::<T>(n) else {
      return;
    };
    if bytes == 0 {
      return;
    }

    // SAFETY: caller guarantees `block`/`n` came from `acquire` above, so the
    // range is exactly one live mapping.
    unsafe {
      libc::munmap(block.as_ptr().cast::<c_void>(), bytes);
    }
  }
}

/// Serves requests from the process heap through `malloc` and `free`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Heap;

impl Strategy for Heap {
  fn name(&self) -> &'static str {
    "malloc"
  }

  fn acquire<T: Copy>(
    &self,
    n: usize,
  ) -> Result<NonNull<T>, AllocError> {
    let bytes = byte_len::<T>(n)?;
    if bytes == 0 {
      return Ok(NonNull::dangling());
    }

    // SAFETY: plain malloc call; the result is checked for null below.
    let addr = unsafe { libc::malloc(bytes) };

    NonNull::new(addr.cast::<T>()).ok_or_else(|| AllocError::OutOfMemory {
      strategy: self.name(),
      bytes,
      source: io::Error::last_os_error(),
    })
  }

  unsafe fn release<T: Copy>(
    &self,
    block: NonNull<T>,
    n: usize,
  ) {
    if !matches!(byte_len::<T>(n), Ok(bytes) if bytes > 0) {
      return;
    }

    // SAFETY: caller guarantees `block` came from `malloc` in `acquire`.
    unsafe {
      libc::free(block.as_ptr().cast::<c_void>());
    }
  }
}

/// Runtime selector for the backing system under test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StrategyKind {
  Mmap,
  Heap,
}

impl StrategyKind {
  /// The number that selects this strategy on the command line.
  pub fn mode(self) -> u8 {
    match self {
      StrategyKind::Mmap => 1,
      StrategyKind::Heap => 2,
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      StrategyKind::Mmap => Mmap.name(),
      StrategyKind::Heap => Heap.name(),
    }
  }
}

impl fmt::Display for StrategyKind {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "Method {}: {} strategy", self.mode(), self.name())
  }
}

impl FromStr for StrategyKind {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "1" => Ok(StrategyKind::Mmap),
      "2" => Ok(StrategyKind::Heap),
      other => Err(ConfigError::UnknownMode(other.to_string())),
    }
  }
}
