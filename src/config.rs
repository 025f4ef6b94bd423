//! Runtime sizing configuration for an [`crate::owner::Owner`].

use std::fmt;

/// Target number of bytes a single chunk should occupy, before rounding.
pub const DEFAULT_TARGET_CHUNK_BYTES: u32 = 65536;

/// Default ceiling on the total number of live elements an Owner will track.
pub const DEFAULT_MAX_ELEMENTS: u32 = 262144;

/// Sizing parameters for an [`crate::owner::Owner`].
///
/// Defaults mirror [`Config::default`]: a 64 KiB chunk target and a ceiling
/// of 262,144 live elements, sized for element widths around 256 bytes.
///
/// ```
/// use genslab::Config;
///
/// let config = Config::new(4096, 1024).unwrap();
///
/// assert_eq!(config.target_chunk_bytes(), 4096);
/// assert_eq!(config.max_elements(), 1024);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
  target_chunk_bytes: u32,
  max_elements: u32,
}

impl Config {
  /// Creates a new configuration, validating both fields are non-zero.
  ///
  /// # Errors
  ///
  /// Returns [`ConfigError::ZeroTargetChunkBytes`] or
  /// [`ConfigError::ZeroMaxElements`] if either argument is `0`.
  pub fn new(target_chunk_bytes: u32, max_elements: u32) -> Result<Self, ConfigError> {
    if target_chunk_bytes == 0 {
      return Err(ConfigError::ZeroTargetChunkBytes);
    }

    if max_elements == 0 {
      return Err(ConfigError::ZeroMaxElements);
    }

    Ok(Self { target_chunk_bytes, max_elements })
  }

  /// The configured target chunk size, in bytes.
  #[inline]
  #[must_use]
  pub const fn target_chunk_bytes(self) -> u32 {
    self.target_chunk_bytes
  }

  /// The configured ceiling on live element count.
  #[inline]
  #[must_use]
  pub const fn max_elements(self) -> u32 {
    self.max_elements
  }

  /// Computes the number of `T`-sized elements that fit in one chunk.
  ///
  /// An element wider than `target_chunk_bytes` still gets one element per
  /// chunk, matching the "grow one at a time" fallback for oversized types.
  #[must_use]
  pub(crate) fn elements_per_chunk<T>(self) -> u32 {
    let element_size: usize = size_of::<T>().max(1);

    if element_size as u32 > self.target_chunk_bytes {
      1
    } else {
      self.target_chunk_bytes / element_size as u32
    }
  }

  /// Computes the maximum number of chunks a thread-safe Owner may allocate,
  /// given the per-chunk element count.
  #[must_use]
  pub(crate) fn chunk_limit(self, elements_per_chunk: u32) -> u32 {
    (self.max_elements / elements_per_chunk) + 1
  }
}

impl Default for Config {
  /// `target_chunk_bytes = 65536`, `max_elements = 262144`.
  #[inline]
  fn default() -> Self {
    Self { target_chunk_bytes: DEFAULT_TARGET_CHUNK_BYTES, max_elements: DEFAULT_MAX_ELEMENTS }
  }
}

/// An error constructing a [`Config`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
  /// `target_chunk_bytes` was `0`.
  #[error("target_chunk_bytes must be non-zero")]
  ZeroTargetChunkBytes,
  /// `max_elements` was `0`.
  #[error("max_elements must be non-zero")]
  ZeroMaxElements,
}

impl fmt::Display for Config {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Config {{ target_chunk_bytes: {}, max_elements: {} }}", self.target_chunk_bytes, self.max_elements)
  }
}
