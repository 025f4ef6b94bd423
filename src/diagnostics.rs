//! Error reporting.
//!
//! The Owner never surfaces an exception or `Result` channel to callers:
//! every failure is reported here and then represented to the caller as a
//! sentinel (`null`/`false`). [`fatal`] is reserved for conditions that
//! leave the allocator in a state it cannot safely continue from.

use std::fmt;

/// Structured diagnostics reported through [`soft_error`] and [`fatal`].
///
/// Public operations never return this type; it exists purely to give
/// logged diagnostics a stable, matchable shape.
#[derive(Debug, thiserror::Error)]
pub(crate) enum OwnerError {
  #[error("element limit for slab of type '{ty}' reached (chunk_limit = {chunk_limit})")]
  CapacityExceeded { ty: &'static str, chunk_limit: u32 },

  #[error("attempted to use an uninitialized handle")]
  UseBeforeInit,

  #[error("attempted to initialize an already-initialized handle")]
  DoubleInit,

  #[error("attempted to initialize the wrong handle")]
  WrongInitTarget,

  #[error("attempted to free an uninitialized or invalid handle")]
  InvalidFree,

  #[error("owner attempted to borrow a handle from itself")]
  SelfBorrow,

  #[error("attempted to borrow a handle the lender does not own")]
  NotOwnedByLender,

  #[error("attempted to borrow a handle that is already borrowed")]
  DuplicateBorrow,

  #[error("{count} handle(s) of type '{ty}' were leaked at owner destruction ({description})")]
  LeakAtDrop { count: u32, ty: &'static str, description: &'static str },
}

/// Reports an unrecoverable condition and aborts the process.
///
/// Used only for validator-epoch overflow and similar invariant violations
/// that would otherwise corrupt slot state silently.
#[cold]
#[track_caller]
pub(crate) fn fatal(message: impl fmt::Display) -> ! {
  tracing::error!(%message, "genslab: fatal error");
  panic!("genslab: fatal error: {message}");
}

/// Reports a recoverable diagnostic. The caller is responsible for choosing
/// the sentinel value it returns.
#[cold]
#[track_caller]
pub(crate) fn soft_error(error: OwnerError) {
  tracing::warn!(%error, "genslab: operation failed");
}
