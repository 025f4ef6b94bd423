//! Monotonic validator-epoch source.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::Relaxed;

/// A monotonic counter used to mint fresh slot validators.
///
/// Each [`crate::owner::Owner`] holds its own `IdSource` rather than sharing
/// one process-wide counter: uniqueness and monotonicity only need to hold
/// within a single Owner's lifetime, and a single counter shared across
/// every element type has no meaningful generic representation in Rust.
#[derive(Debug, Default)]
pub(crate) struct IdSource {
  counter: AtomicU64,
}

impl IdSource {
  #[inline]
  pub(crate) const fn new() -> Self {
    Self { counter: AtomicU64::new(0) }
  }

  /// Returns the next value in the sequence. Never returns `0`.
  #[inline]
  pub(crate) fn next(&self) -> u64 {
    self.counter.fetch_add(1, Relaxed) + 1
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_next_is_monotonic_and_nonzero() {
    let source: IdSource = IdSource::new();
    let mut previous: u64 = 0;

    for _ in 0..1000 {
      let value: u64 = source.next();

      assert_ne!(value, 0);
      assert!(value > previous);

      previous = value;
    }
  }
}
