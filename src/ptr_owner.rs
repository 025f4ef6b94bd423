//! A pointer-valued specialization of [`Owner`](crate::owner::Owner).

use crate::handle::Handle;
use crate::owner::Owner;
use crate::sync::Strategy;
use crate::sync::ThreadSafe;

/// An `Owner` specialized for storing raw pointers.
///
/// Storage is `*mut T` rather than `NonNull<T>` specifically so that a null
/// pointer can be stored as a live payload — `Owner<NonNull<T>, L>` would
/// forbid that.
pub struct PtrOwner<T, L = ThreadSafe>
where
  L: Strategy,
{
  owner: Owner<*mut T, L>,
}

impl<T, L> PtrOwner<T, L>
where
  L: Strategy,
{
  /// Creates a new, empty `PtrOwner` with the given sizing configuration.
  #[must_use]
  pub fn new(config: crate::config::Config) -> Self {
    Self { owner: Owner::new(config) }
  }

  /// Reserves a slot and stores `ptr` in it.
  pub fn make(&self, ptr: *mut T) -> Handle {
    self.owner.make_with(ptr)
  }

  /// Returns the pointer stored at `handle`, or null if the handle does not
  /// resolve to a live slot.
  #[must_use]
  pub fn get(&self, handle: Handle) -> *mut T {
    self.owner.get(handle, |stored| *stored).unwrap_or(std::ptr::null_mut())
  }

  /// Overwrites the pointer stored at `handle` without touching its
  /// validator. Fails (returning `false`) if the handle is not live.
  pub fn replace(&self, handle: Handle, new_ptr: *mut T) -> bool {
    self.owner.get(handle, |stored| *stored = new_ptr).is_some()
  }

  /// Returns `true` if `handle` resolves to a slot this owner tracks.
  #[must_use]
  pub fn owns(&self, handle: Handle) -> bool {
    self.owner.owns(handle)
  }

  /// Destroys the slot at `handle`. The stored pointer is not freed; this
  /// owner does not take ownership of the pointee.
  pub fn free(&self, handle: Handle) {
    self.owner.free(handle);
  }

  /// Returns the number of currently live slots.
  #[must_use]
  pub fn count(&self) -> u32 {
    self.owner.count()
  }
}

impl<T, L> Default for PtrOwner<T, L>
where
  L: Strategy,
{
  #[inline]
  fn default() -> Self {
    Self { owner: Owner::default() }
  }
}
