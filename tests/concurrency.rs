//! Thread-safe mixed workload: many threads hammering one `Owner` with
//! random `make`/`get`/`free` traffic should never corrupt the slab.

use std::sync::Arc;
use std::sync::Barrier;
use std::sync::Mutex;
use std::thread;

use genslab::Config;
use genslab::Owner;
use genslab::ThreadSafe;

const THREADS: usize = 8;
const OPS_PER_THREAD: usize = 2_000;

#[test]
fn mixed_make_get_free_workload_never_observes_corruption() {
  let config: Config = Config::new(256, 4096).unwrap();
  let owner: Arc<Owner<u64, ThreadSafe>> = Arc::new(Owner::new(config));
  let barrier: Arc<Barrier> = Arc::new(Barrier::new(THREADS));

  let handles: Vec<_> = (0..THREADS)
    .map(|thread_id| {
      let owner: Arc<Owner<u64, ThreadSafe>> = Arc::clone(&owner);
      let barrier: Arc<Barrier> = Arc::clone(&barrier);

      thread::spawn(move || {
        barrier.wait();

        let mut owned: Vec<genslab::Handle> = Vec::new();

        for i in 0..OPS_PER_THREAD {
          let seed: usize = thread_id * OPS_PER_THREAD + i;

          match seed % 3 {
            0 => {
              let handle = owner.make_with(seed as u64);

              if !handle.is_null() {
                // Every handle we just made must resolve to exactly the
                // value we stored, and never to anyone else's payload.
                let value = owner.get(handle, |v| *v);
                assert_eq!(value, Some(seed as u64));
                owned.push(handle);
              }
            }
            1 => {
              if let Some(handle) = owned.pop() {
                let value = owner.get(handle, |v| *v);
                assert!(value.is_some(), "a handle we still hold must resolve");
              }
            }
            _ => {
              if let Some(handle) = owned.pop() {
                owner.free(handle);
                assert!(!owner.owns(handle));
              }
            }
          }
        }

        for handle in owned {
          owner.free(handle);
        }
      })
    })
    .collect();

  for handle in handles {
    handle.join().expect("worker thread panicked");
  }

  assert_eq!(owner.count(), 0, "every handle made was eventually freed");
}

#[test]
fn concurrent_lending_resolves_consistently() {
  let lender: Arc<Owner<u32, ThreadSafe>> = Arc::new(Owner::default());
  let borrower: Arc<Owner<u32, ThreadSafe>> = Arc::new(Owner::default());
  let seen: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));

  let handle = lender.make_with(11);

  assert!(borrower.borrow(&lender, handle));

  let handles: Vec<_> = (0..4)
    .map(|_| {
      let borrower: Arc<Owner<u32, ThreadSafe>> = Arc::clone(&borrower);
      let seen: Arc<Mutex<Vec<u32>>> = Arc::clone(&seen);

      thread::spawn(move || {
        if let Some(value) = borrower.get(handle, |v| *v) {
          seen.lock().unwrap().push(value);
        }
      })
    })
    .collect();

  for handle in handles {
    handle.join().expect("worker thread panicked");
  }

  assert!(seen.lock().unwrap().iter().all(|&v| v == 11));
}
