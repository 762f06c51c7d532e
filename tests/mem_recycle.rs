//! Mem handoff scenario (spec.md §8 scenario 6): a single-threaded loop
//! reusing one `Mem` should allocate only once for the chain's sentinel and
//! once for the first action; every subsequent `run_with` call should reuse
//! the slab handed back by the previous one.

use action_chain::{ActionChain, Mem};
use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicI64, Ordering};

struct CountingAllocator;

static ALLOC_COUNT: AtomicI64 = AtomicI64::new(0);

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        ALLOC_COUNT.fetch_add(1, Ordering::SeqCst);
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }
}

#[global_allocator]
static ALLOCATOR: CountingAllocator = CountingAllocator;

#[test]
fn steady_state_recycling_performs_no_further_allocations() {
    let before_chain = ALLOC_COUNT.load(Ordering::SeqCst);
    let chain = ActionChain::new();
    // One allocation for the sentinel.
    assert_eq!(ALLOC_COUNT.load(Ordering::SeqCst) - before_chain, 1);

    let mut mem = Mem::new();
    let before_loop = ALLOC_COUNT.load(Ordering::SeqCst);

    const ITERATIONS: usize = 100_000;
    for i in 0..ITERATIONS {
        chain.run_with(&mut mem, move || {
            let _ = i;
        });
    }

    // The first call allocates (mem starts empty); every later call found a
    // sealed predecessor and recycled the slab handed back to it, so the
    // loop as a whole performs exactly one allocation.
    assert_eq!(ALLOC_COUNT.load(Ordering::SeqCst) - before_loop, 1);
}
