//! The allocator façade: `Owner<T, L>`.

use std::any;
use std::collections::HashMap;
use std::fmt;
use std::ptr::NonNull;

use crate::config::Config;
use crate::diagnostics;
use crate::diagnostics::OwnerError;
use crate::handle::Handle;
use crate::handle::SlotState;
use crate::id::IdSource;
use crate::storage::Reservation;
use crate::storage::Storage;
use crate::sync::Lockable;
use crate::sync::Strategy;
use crate::sync::ThreadSafe;

/// A chunked slab allocator mapping opaque [`Handle`] values to stably
/// addressed `T` storage.
///
/// `L` selects the synchronization strategy (default [`ThreadSafe`]); see
/// the [`crate::sync`] module. An `Owner<T, Unsynchronized>` cannot be
/// shared across threads at all — the compiler rejects it.
///
/// ```
/// use genslab::Owner;
///
/// let owner: Owner<u32> = Owner::default();
/// let handle = owner.make_with(42);
///
/// assert!(owner.owns(handle));
/// assert_eq!(owner.get(handle, |value| *value), Some(42));
///
/// owner.free(handle);
/// assert!(!owner.owns(handle));
/// ```
pub struct Owner<T, L = ThreadSafe>
where
  L: Strategy,
{
  inner: L::Storage<Inner<T, L>>,
}

struct Inner<T, L>
where
  L: Strategy,
{
  storage: Storage<T>,
  id_source: IdSource,
  borrowed: HashMap<u64, NonNull<Owner<T, L>>>,
  lent: HashMap<u64, NonNull<Owner<T, L>>>,
}

// SAFETY: `Owner` only exposes its raw `NonNull` lending pointers through
// `borrow`'s documented lifetime contract; the pointee is never accessed
// without going through the foreign Owner's own locking.
unsafe impl<T> Send for Owner<T, ThreadSafe> where T: Send {}
// SAFETY: see above; `Mutex<Inner<T, ThreadSafe>>` itself is `Sync` when
// `T: Send`, and every access to the lending maps is mutex-guarded.
unsafe impl<T> Sync for Owner<T, ThreadSafe> where T: Send {}
// SAFETY: moving an `Owner<T, Unsynchronized>` to another thread is sound
// whenever `T: Send`; it is never made `Sync` because `UnsyncCell` isn't.
unsafe impl<T> Send for Owner<T, crate::sync::Unsynchronized> where T: Send {}

impl<T, L> Owner<T, L>
where
  L: Strategy,
{
  /// Creates a new, empty Owner with the given sizing configuration.
  #[must_use]
  pub fn new(config: Config) -> Self {
    let inner: Inner<T, L> =
      Inner { storage: Storage::new(config), id_source: IdSource::new(), borrowed: HashMap::new(), lent: HashMap::new() };

    Self { inner: L::wrap(inner) }
  }

  /// Reserves a slot but does not construct its payload.
  ///
  /// The returned handle is valid for exactly one subsequent [`initialize`]
  /// / [`initialize_with`] call and for [`owns`], but not for [`get`] until
  /// initialized.
  ///
  /// [`initialize`]: Self::initialize
  /// [`initialize_with`]: Self::initialize_with
  /// [`owns`]: Self::owns
  /// [`get`]: Self::get
  pub fn allocate(&self) -> Handle {
    self.inner.with(|inner| match inner.storage.reserve(&inner.id_source) {
      Ok(reservation) => Handle::new(reservation.index, reservation.epoch),
      Err(error) => {
        diagnostics::soft_error(error);
        Handle::NULL
      }
    })
  }

  /// Reserves a slot and default-constructs its payload.
  pub fn make(&self) -> Handle
  where
    T: Default,
  {
    self.make_with_ctor(T::default)
  }

  /// Reserves a slot and constructs its payload from `value`.
  pub fn make_with(&self, value: T) -> Handle {
    self.make_with_ctor(move || value)
  }

  fn make_with_ctor(&self, ctor: impl FnOnce() -> T) -> Handle {
    self.inner.with(|inner| match inner.storage.reserve(&inner.id_source) {
      Ok(reservation) => {
        let handle: Handle = Handle::new(reservation.index, reservation.epoch);

        inner.storage.slot_mut(reservation.index).expect("index was just reserved").write(reservation.epoch, ctor());

        handle
      }
      Err(error) => {
        diagnostics::soft_error(error);
        Handle::NULL
      }
    })
  }

  /// Transitions `handle` from allocated-uninitialized to live,
  /// default-constructing its payload.
  ///
  /// Returns `false` (and reports a diagnostic) if the slot is already live
  /// (double-init) or the handle's epoch does not match the slot (stale
  /// handle).
  pub fn initialize(&self, handle: Handle) -> bool
  where
    T: Default,
  {
    self.initialize_with_ctor(handle, T::default)
  }

  /// Transitions `handle` from allocated-uninitialized to live, constructing
  /// its payload from `value`. See [`initialize`](Self::initialize).
  pub fn initialize_with(&self, handle: Handle, value: T) -> bool {
    self.initialize_with_ctor(handle, move || value)
  }

  fn initialize_with_ctor(&self, handle: Handle, ctor: impl FnOnce() -> T) -> bool {
    self.inner.with(|inner| {
      let index: u32 = handle.slot_index();
      let validator: u32 = handle.validator();

      let Some(slot) = inner.storage.slot_mut(index) else {
        return false;
      };

      match slot.state() {
        SlotState::Uninit(epoch) if epoch == validator => {
          slot.write(epoch, ctor());
          true
        }
        SlotState::Uninit(_) => {
          diagnostics::soft_error(OwnerError::WrongInitTarget);
          false
        }
        SlotState::Live(_) => {
          diagnostics::soft_error(OwnerError::DoubleInit);
          false
        }
        SlotState::Vacant => false,
      }
    })
  }

  /// Resolves `handle` and runs `f` against its payload, returning `None`
  /// if the handle is stale, out of range, or unresolvable.
  ///
  /// If `handle` was borrowed from another Owner (via [`borrow`]), the call
  /// is delegated to that Owner. The Owner's lock is held for the duration
  /// of this call — including the run of `f` — and released immediately
  /// afterward; nothing protects the payload against concurrent mutation
  /// once `f` returns.
  ///
  /// [`borrow`]: Self::borrow
  pub fn get<R>(&self, handle: Handle, f: impl FnOnce(&mut T) -> R) -> Option<R> {
    if handle.is_null() {
      return None;
    }

    let id: u64 = handle.into_bits();
    let mut pending: Option<_> = Some(f);

    let local: Result<Option<R>, NonNull<Owner<T, L>>> = self.inner.with(|inner| {
      if let Some(&foreign) = inner.borrowed.get(&id) {
        Err(foreign)
      } else {
        let f = pending.take().expect("not yet consumed on the local path");
        Ok(Self::get_local(inner, handle, f))
      }
    });

    match local {
      Ok(result) => result,
      Err(foreign) => {
        let f = pending.take().expect("not yet consumed on the foreign path");

        // SAFETY: `foreign` was registered by `borrow`, whose contract
        // requires the foreign Owner to outlive this borrow entry.
        unsafe { foreign.as_ref() }.get(handle, f)
      }
    }
  }

  fn get_local<R>(inner: &mut Inner<T, L>, handle: Handle, f: impl FnOnce(&mut T) -> R) -> Option<R> {
    let index: u32 = handle.slot_index();
    let validator: u32 = handle.validator();
    let slot = inner.storage.slot_mut(index)?;

    match slot.state() {
      SlotState::Live(epoch) if epoch == validator => {
        // SAFETY: state was just confirmed `Live`.
        Some(f(unsafe { slot.assume_live_mut() }))
      }
      SlotState::Uninit(epoch) if epoch == validator => {
        diagnostics::soft_error(OwnerError::UseBeforeInit);
        None
      }
      SlotState::Uninit(_) | SlotState::Live(_) | SlotState::Vacant => None,
    }
  }

  /// Returns `true` if `handle` currently resolves to a slot this Owner (or
  /// a foreign Owner it borrows from) owns — including allocated-but-
  /// uninitialized slots.
  ///
  /// An `owns` call on a borrowed handle releases this Owner's lock before
  /// recursing into the foreign Owner; the returned value is a momentary
  /// snapshot and may be stale by the time it is observed.
  pub fn owns(&self, handle: Handle) -> bool {
    if handle.is_null() {
      return false;
    }

    let id: u64 = handle.into_bits();

    let local: Result<bool, NonNull<Owner<T, L>>> = self.inner.with(|inner| {
      if let Some(&foreign) = inner.borrowed.get(&id) {
        Err(foreign)
      } else {
        Ok(Self::owns_local(inner, handle))
      }
    });

    match local {
      Ok(owned) => owned,
      // SAFETY: see `get`'s delegation comment.
      Err(foreign) => unsafe { foreign.as_ref() }.owns(handle),
    }
  }

  fn owns_local(inner: &Inner<T, L>, handle: Handle) -> bool {
    let index: u32 = handle.slot_index();
    let validator: u32 = handle.validator();

    match inner.storage.slot(index).map(|slot| slot.state()) {
      Some(SlotState::Uninit(epoch) | SlotState::Live(epoch)) => epoch == validator,
      Some(SlotState::Vacant) | None => false,
    }
  }

  /// Destroys the payload at `handle`, invalidates the slot, and returns it
  /// to the freelist.
  ///
  /// Reports a diagnostic and leaves state unchanged if the handle is
  /// stale, not yet initialized, or otherwise invalid. Does not delegate
  /// through `borrowed` — `free` must be called on the Owner that actually
  /// owns the handle. If this Owner had lent `handle` out, the borrower's
  /// `borrowed` entry is also removed.
  pub fn free(&self, handle: Handle) {
    if handle.is_null() {
      return;
    }

    self.inner.with(|inner| {
      let index: u32 = handle.slot_index();
      let validator: u32 = handle.validator();

      let Some(slot) = inner.storage.slot_mut(index) else {
        diagnostics::soft_error(OwnerError::InvalidFree);
        return;
      };

      match slot.state() {
        SlotState::Live(epoch) if epoch == validator => {
          // SAFETY: state was just confirmed `Live`.
          unsafe {
            inner.storage.vacate(index);
          }

          let id: u64 = handle.into_bits();

          if let Some(borrower) = inner.lent.remove(&id) {
            // SAFETY: `borrower` was registered by `borrow`, whose contract
            // requires the borrowing Owner to outlive this lending entry.
            unsafe { borrower.as_ref() }.remove_borrowed_entry(id);
          }
        }
        SlotState::Uninit(_) | SlotState::Live(_) | SlotState::Vacant => {
          diagnostics::soft_error(OwnerError::InvalidFree);
        }
      }
    });
  }

  fn remove_borrowed_entry(&self, id: u64) {
    self.inner.with(|inner| {
      inner.borrowed.remove(&id);
    });
  }

  /// Returns the number of currently live slots.
  #[must_use]
  pub fn count(&self) -> u32 {
    self.inner.with(|inner| inner.storage.live_count())
  }

  /// Appends the handle of every occupied slot (live or allocated-
  /// uninitialized) to `out`, in ascending slot-index order.
  pub fn enumerate(&self, out: &mut Vec<Handle>) {
    self.inner.with(|inner| {
      for index in inner.storage.occupied_indices() {
        if let Some(handle) = Self::handle_at(inner, index) {
          out.push(handle);
        }
      }
    });
  }

  /// Identical to [`enumerate`](Self::enumerate), but writes into a
  /// caller-provided buffer. Returns the number of handles written; the
  /// caller should ensure `buf.len() >= count()` or accept truncation.
  pub fn fill_buffer(&self, buf: &mut [Handle]) -> usize {
    self.inner.with(|inner| {
      let mut written: usize = 0;

      for index in inner.storage.occupied_indices() {
        let Some(slot) = buf.get_mut(written) else {
          break;
        };

        if let Some(handle) = Self::handle_at(inner, index) {
          *slot = handle;
          written += 1;
        }
      }

      written
    })
  }

  fn handle_at(inner: &Inner<T, L>, index: u32) -> Option<Handle> {
    match inner.storage.slot(index)?.state() {
      SlotState::Uninit(epoch) | SlotState::Live(epoch) => Some(Handle::new(index, epoch)),
      SlotState::Vacant => None,
    }
  }

  /// Sets a human-readable tag used only in diagnostic messages.
  pub fn set_description(&self, description: &'static str) {
    self.inner.with(|inner| inner.storage.set_description(description));
  }

  /// Registers that `handle`, truly owned by `other`, can also be resolved
  /// through `self`.
  ///
  /// Fails (returning `false` and reporting a diagnostic) if `self` and
  /// `other` are the same Owner, if `other` does not own `handle`, or if
  /// `self` is already borrowing `handle`.
  ///
  /// # Safety contract
  ///
  /// `other` must remain alive, and must not move to a different address,
  /// for as long as this borrow registration exists — either until `self`
  /// releases it via [`free`](Self::free)-driven cleanup, or until `other`
  /// is destroyed (which the lending maps on both sides do not currently
  /// guard against; see the crate's lending design notes).
  pub fn borrow(&self, other: &Self, handle: Handle) -> bool {
    if std::ptr::eq(self, other) {
      diagnostics::soft_error(OwnerError::SelfBorrow);
      return false;
    }

    if !other.owns(handle) {
      diagnostics::soft_error(OwnerError::NotOwnedByLender);
      return false;
    }

    let id: u64 = handle.into_bits();

    let inserted: bool = self.inner.with(|inner| {
      if inner.borrowed.contains_key(&id) {
        false
      } else {
        inner.borrowed.insert(id, NonNull::from(other));
        true
      }
    });

    if !inserted {
      diagnostics::soft_error(OwnerError::DuplicateBorrow);
      return false;
    }

    other.inner.with(|inner| {
      inner.lent.insert(id, NonNull::from(self));
    });

    true
  }
}

impl<T, L> Default for Owner<T, L>
where
  L: Strategy,
{
  #[inline]
  fn default() -> Self {
    Self::new(Config::default())
  }
}

impl<T, L> fmt::Debug for Owner<T, L>
where
  L: Strategy,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Owner").field("count", &self.count()).field("type", &any::type_name::<T>()).finish_non_exhaustive()
  }
}

impl<T, L> Drop for Owner<T, L>
where
  L: Strategy,
{
  fn drop(&mut self) {
    let (live, description) = self.inner.with(|inner| (inner.storage.live_count(), inner.storage.description()));

    if live > 0 {
      diagnostics::soft_error(OwnerError::LeakAtDrop { count: live, ty: any::type_name::<T>(), description });
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sync::Unsynchronized;

  #[test]
  fn test_basic_round_trip() {
    let owner: Owner<u32> = Owner::new(Config::new(64, 256).unwrap());
    let handle: Handle = owner.make_with(42);

    assert!(owner.owns(handle));
    assert_eq!(owner.get(handle, |value| *value), Some(42));
    assert_eq!(owner.count(), 1);

    owner.free(handle);

    assert!(!owner.owns(handle));
    assert_eq!(owner.get(handle, |value| *value), None);
    assert_eq!(owner.count(), 0);
  }

  #[test]
  fn test_stale_handle_after_reuse() {
    let owner: Owner<u32> = Owner::default();

    let h1: Handle = owner.make_with(1);
    owner.free(h1);
    let h2: Handle = owner.make_with(2);

    assert_eq!(h1.into_bits() as u32, h2.into_bits() as u32);
    assert_ne!(h1, h2);
    assert_eq!(owner.get(h1, |value| *value), None);
    assert_eq!(owner.get(h2, |value| *value), Some(2));
  }

  #[test]
  fn test_chunk_growth() {
    let owner: Owner<u64, Unsynchronized> = Owner::new(Config::new(16, 32).unwrap());
    let handles: Vec<Handle> = (0..5).map(|i| owner.make_with(i)).collect();

    for (i, handle) in handles.iter().enumerate() {
      assert_eq!(owner.get(*handle, |value| *value), Some(i as u64));
    }
  }

  #[test]
  fn test_capacity_limit_reports_and_recovers() {
    let owner: Owner<u64, Unsynchronized> = Owner::new(Config::new(16, 4).unwrap());
    let handles: Vec<Handle> = (0..6).map(|i| owner.make_with(i)).collect();

    assert!(handles.iter().all(|h| !h.is_null()));

    let overflow: Handle = owner.make_with(6);

    assert!(overflow.is_null());

    for (i, handle) in handles.iter().enumerate() {
      assert_eq!(owner.get(*handle, |value| *value), Some(i as u64));
    }
  }

  #[test]
  fn test_allocate_then_initialize() {
    let owner: Owner<u32, Unsynchronized> = Owner::default();
    let handle: Handle = owner.allocate();

    assert!(owner.owns(handle));
    assert_eq!(owner.get(handle, |value| *value), None);

    assert!(owner.initialize_with(handle, 99));
    assert_eq!(owner.get(handle, |value| *value), Some(99));

    assert!(!owner.initialize_with(handle, 100));
    assert_eq!(owner.get(handle, |value| *value), Some(99));
  }

  #[test]
  fn test_cross_owner_lending() {
    let a: Owner<u32, Unsynchronized> = Owner::default();
    let b: Owner<u32, Unsynchronized> = Owner::default();

    let handle: Handle = a.make_with(7);

    assert!(b.borrow(&a, handle));
    assert!(a.owns(handle));
    assert!(b.owns(handle));
    assert_eq!(b.get(handle, |value| *value), Some(7));

    a.free(handle);

    assert!(!a.owns(handle));
    assert!(!b.owns(handle));
  }

  #[test]
  fn test_self_borrow_and_duplicate_borrow_are_rejected() {
    let a: Owner<u32, Unsynchronized> = Owner::default();
    let b: Owner<u32, Unsynchronized> = Owner::default();
    let handle: Handle = a.make_with(1);

    assert!(!a.borrow(&a, handle));
    assert!(b.borrow(&a, handle));
    assert!(!b.borrow(&a, handle));
  }

  #[test]
  fn test_enumerate_includes_uninitialized_slots() {
    let owner: Owner<u32, Unsynchronized> = Owner::default();
    let live: Handle = owner.make_with(1);
    let uninit: Handle = owner.allocate();

    let mut out: Vec<Handle> = Vec::new();
    owner.enumerate(&mut out);

    assert_eq!(out.len(), 2);
    assert!(out.contains(&live));
    assert!(out.contains(&uninit));
  }

  #[test]
  fn test_independent_owners_do_not_cross_own() {
    let a: Owner<u32, Unsynchronized> = Owner::default();
    let b: Owner<u32, Unsynchronized> = Owner::default();

    let h: Handle = a.make_with(5);

    assert!(!b.owns(h));
  }

  #[test]
  fn test_leak_at_drop_does_not_panic() {
    let owner: Owner<u32, Unsynchronized> = Owner::default();
    let _handle: Handle = owner.make_with(1);

    drop(owner);
  }
}
