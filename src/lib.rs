//! A chunked, growable slab allocator with generational handles.
//!
//! `genslab` provides [`Owner`], a resource-management substrate for systems
//! that hand out opaque 64-bit handles instead of raw pointers to live
//! objects: a renderer, physics engine, or scripting host can stash a
//! [`Handle`] anywhere without holding a borrow, and later resolve it back
//! to a stably-addressed payload — or find out cheaply that it's gone.
//!
//! # Overview
//!
//! An [`Owner<T, L>`] hands out a [`Handle`] from [`Owner::make`] or
//! [`Owner::make_with`]. Internally it reserves a slot in a chunked backing
//! store, stamps it with a fresh validator epoch, and packs the slot index
//! and epoch into the returned handle. [`Owner::get`] decodes a handle,
//! checks the slot's current epoch against the one baked into the handle,
//! and only then hands back access to the payload — a handle whose slot has
//! since been reused for something else simply resolves to nothing.
//!
//! ```
//! use genslab::Owner;
//!
//! let owner: Owner<String> = Owner::default();
//! let handle = owner.make_with("hello".to_owned());
//!
//! let shouted = owner.get(handle, |s| s.to_uppercase());
//! assert_eq!(shouted, Some("HELLO".to_owned()));
//!
//! owner.free(handle);
//! assert!(!owner.owns(handle));
//! ```
//!
//! # Configuration
//!
//! Storage is sized at construction time through [`Config`], which derives
//! a chunk's element count and the maximum number of chunks from a target
//! chunk byte size and a maximum element count:
//!
//! ```
//! use genslab::{Config, Owner};
//!
//! let config = Config::new(4096, 1024).unwrap();
//! let owner: Owner<u64> = Owner::new(config);
//! ```
//!
//! [`Config::default`] reproduces the crate's built-in defaults (a 64 KiB
//! chunk target, 262,144 elements).
//!
//! # Concurrency
//!
//! An `Owner` is parameterized by a synchronization strategy: [`ThreadSafe`]
//! (the default) guards every operation with a single internal mutex, while
//! [`Unsynchronized`] carries no lock at all and cannot be shared across
//! threads — the type simply isn't [`Sync`].
//!
//! ```
//! use genslab::{Owner, ThreadSafe};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let owner: Arc<Owner<u64, ThreadSafe>> = Arc::new(Owner::default());
//!
//! let handles: Vec<_> = (0..4)
//!   .map(|n| {
//!     let owner = Arc::clone(&owner);
//!     thread::spawn(move || owner.make_with(n))
//!   })
//!   .collect();
//!
//! for handle in handles {
//!   handle.join().unwrap();
//! }
//!
//! assert_eq!(owner.count(), 4);
//! ```
//!
//! # Lending
//!
//! A handle minted by one `Owner` can be resolved through another via
//! [`Owner::borrow`], without transferring ownership:
//!
//! ```
//! use genslab::Owner;
//!
//! let lender: Owner<u32> = Owner::default();
//! let borrower: Owner<u32> = Owner::default();
//!
//! let handle = lender.make_with(9);
//! assert!(borrower.borrow(&lender, handle));
//!
//! assert_eq!(borrower.get(handle, |v| *v), Some(9));
//! ```

mod config;
mod diagnostics;
mod handle;
mod id;
mod memory;
mod owner;
mod ptr_owner;
mod slot;
mod storage;
mod sync;

pub use self::config::Config;
pub use self::config::ConfigError;
pub use self::handle::Handle;
pub use self::memory::alloc_aligned;
pub use self::memory::alloc_count;
pub use self::memory::alloc_padded;
pub use self::memory::alloc_raw;
pub use self::memory::free_aligned;
pub use self::memory::free_padded;
pub use self::memory::free_raw;
pub use self::memory::mem_max_usage;
pub use self::memory::mem_usage;
pub use self::memory::realloc_aligned;
pub use self::memory::realloc_raw;
pub use self::owner::Owner;
pub use self::ptr_owner::PtrOwner;
pub use self::sync::Strategy;
pub use self::sync::ThreadSafe;
pub use self::sync::Unsynchronized;
