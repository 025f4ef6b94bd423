//! The opaque 64-bit handle type and its validator encoding.

use std::fmt;
use std::fmt::Debug;
use std::fmt::Display;

/// Sentinel validator meaning "never occupied, or freed": the slot holds no
/// payload and its index is available on the freelist.
pub(crate) const VACANT: u32 = 0xFFFF_FFFF;

/// High bit of a non-sentinel validator: set while a slot is reserved but not
/// yet constructed (`allocate` without a matching `initialize`).
pub(crate) const UNINIT_BIT: u32 = 0x8000_0000;

/// Mask isolating the 31-bit epoch from a validator word.
pub(crate) const EPOCH_MASK: u32 = 0x7FFF_FFFF;

/// An opaque identifier returned by [`crate::owner::Owner`] operations.
///
/// A `Handle` packs a slot index (low 32 bits) and a validator epoch (high 32
/// bits). The all-zero handle is the distinguished [null handle](Handle::NULL)
/// and never refers to a live slot.
///
/// Handles are process-local: they have no defined meaning across process
/// boundaries and should not be persisted or sent over the wire.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Handle {
  bits: u64,
}

impl Handle {
  /// The distinguished null handle. Never valid for any Owner.
  pub const NULL: Self = Self { bits: 0 };

  /// Creates a handle from its packed 64-bit representation.
  ///
  /// The returned handle may not correspond to any live slot in any Owner;
  /// using an arbitrary bit pattern is safe but will return `None`/`false`
  /// from every Owner operation.
  #[inline]
  #[must_use]
  pub const fn from_bits(bits: u64) -> Self {
    Self { bits }
  }

  /// Returns the packed 64-bit representation of this handle.
  #[inline]
  #[must_use]
  pub const fn into_bits(self) -> u64 {
    self.bits
  }

  /// Returns `true` if this is the [null handle](Handle::NULL).
  #[inline]
  #[must_use]
  pub const fn is_null(self) -> bool {
    self.bits == 0
  }

  #[inline]
  pub(crate) const fn new(slot_index: u32, validator: u32) -> Self {
    Self { bits: ((validator as u64) << 32) | slot_index as u64 }
  }

  #[inline]
  pub(crate) const fn slot_index(self) -> u32 {
    (self.bits & 0xFFFF_FFFF) as u32
  }

  #[inline]
  pub(crate) const fn validator(self) -> u32 {
    (self.bits >> 32) as u32
  }
}

impl Debug for Handle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Handle")
      .field("slot_index", &self.slot_index())
      .field("validator", &format_args!("{:#010x}", self.validator()))
      .finish()
  }
}

impl Display for Handle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    Display::fmt(&self.bits, f)
  }
}

impl Default for Handle {
  #[inline]
  fn default() -> Self {
    Self::NULL
  }
}

/// The decoded state of a slot's validator word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SlotState {
  /// Never occupied, or freed; payload storage is garbage.
  Vacant,
  /// Reserved but not yet constructed; holds the minted epoch.
  Uninit(u32),
  /// Live and initialized; holds the minted epoch.
  Live(u32),
}

impl SlotState {
  #[inline]
  pub(crate) const fn decode(validator: u32) -> Self {
    if validator == VACANT {
      Self::Vacant
    } else if validator & UNINIT_BIT != 0 {
      Self::Uninit(validator & EPOCH_MASK)
    } else {
      Self::Live(validator)
    }
  }

  #[inline]
  pub(crate) const fn encode(self) -> u32 {
    match self {
      Self::Vacant => VACANT,
      Self::Uninit(epoch) => epoch | UNINIT_BIT,
      Self::Live(epoch) => epoch,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_null_handle_is_all_zero() {
    assert_eq!(Handle::NULL.into_bits(), 0);
    assert!(Handle::NULL.is_null());
  }

  #[test]
  fn test_handle_pack_unpack_roundtrip() {
    let handle: Handle = Handle::new(0x1234_5678, 0x0000_0099);

    assert_eq!(handle.slot_index(), 0x1234_5678);
    assert_eq!(handle.validator(), 0x0000_0099);
    assert!(!handle.is_null());
  }

  #[test]
  fn test_slot_state_roundtrip() {
    assert_eq!(SlotState::decode(VACANT), SlotState::Vacant);
    assert_eq!(SlotState::decode(VACANT).encode(), VACANT);

    let uninit: SlotState = SlotState::decode(0x42 | UNINIT_BIT);
    assert_eq!(uninit, SlotState::Uninit(0x42));
    assert_eq!(uninit.encode(), 0x42 | UNINIT_BIT);

    let live: SlotState = SlotState::decode(0x42);
    assert_eq!(live, SlotState::Live(0x42));
    assert_eq!(live.encode(), 0x42);
  }

  #[test]
  fn test_from_bits_into_bits_roundtrip() {
    let handle: Handle = Handle::from_bits(0xDEAD_BEEF_0000_0001);

    assert_eq!(handle.into_bits(), 0xDEAD_BEEF_0000_0001);
  }
}
