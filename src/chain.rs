//! The public surface: [`ActionChain`] itself.

use std::cell::RefCell;

use crossbeam_utils::CachePadded;

use crate::mem::{Mem, Slab};
use crate::node::Node;
use crate::sync::{AtomicPtr, Ordering};

/// A mutual-exclusion primitive that serializes caller-supplied actions
/// across threads without ever parking one on a lock.
///
/// Instead of blocking contending threads, `run` forms a linked chain of
/// pending actions and lets exactly one thread at a time drain it on behalf
/// of everyone who published to it. Publishing (`run`'s producer side) is
/// wait-free; the thread that ends up draining the chain runs a lock-free
/// loop and returns as soon as it reaches a node nobody has continued past.
///
/// ```
/// use action_chain::ActionChain;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let chain = Arc::new(ActionChain::new());
/// let counter = Arc::new(AtomicUsize::new(0));
///
/// let mut handles = Vec::new();
/// for _ in 0..4 {
///     let chain = chain.clone();
///     let counter = counter.clone();
///     handles.push(std::thread::spawn(move || {
///         chain.run(move || {
///             counter.fetch_add(1, Ordering::SeqCst);
///         });
///     }));
/// }
/// for h in handles {
///     h.join().unwrap();
/// }
/// assert_eq!(counter.load(Ordering::SeqCst), 4);
/// ```
pub struct ActionChain {
    tail: CachePadded<AtomicPtr<Node>>,
}

thread_local! {
    static DEFAULT_MEM: RefCell<Mem> = RefCell::new(Mem::new());
}

impl ActionChain {
    /// Creates an empty chain.
    ///
    /// Internally this allocates a sentinel node with a no-op action and
    /// drains it immediately, so that from the outside the chain already
    /// looks like it holds one fully-executed, sealed node — the same
    /// state any real action is left in once an executor finishes it. That
    /// removes the empty-chain special case from `run`'s hot path: the
    /// very first `run` call sees an already-sealed predecessor and simply
    /// takes over draining, exactly like every call after it.
    pub fn new() -> ActionChain {
        let slab = Slab::alloc();
        // SAFETY: `slab` is fresh and not yet visible to any other thread.
        let sentinel = unsafe { Node::init(slab, || {}) };
        // SAFETY: `sentinel` was just created and nothing else can race on
        // it before `ActionChain::new` returns.
        unsafe { Node::run_all(sentinel) };
        ActionChain {
            tail: CachePadded::new(AtomicPtr::new(sentinel)),
        }
    }

    /// Publishes `action` for serialized execution, using this thread's
    /// default per-thread [`Mem`] to avoid allocator traffic when possible.
    ///
    /// Returns once `action` has either run on this thread (alone or
    /// alongside actions contributed by other threads) or been handed off
    /// to whichever thread is currently draining the chain.
    pub fn run<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        DEFAULT_MEM.with(|mem| self.run_with(&mut mem.borrow_mut(), action));
    }

    /// Like [`ActionChain::run`], but draws the node allocation from the
    /// caller-supplied `mem` instead of a process-wide per-thread cache.
    ///
    /// `mem` must not be shared with a concurrently in-flight `run_with`
    /// call on any chain; Rust's exclusive-borrow rules already enforce
    /// this as long as the caller does not reach for extra `unsafe`.
    pub fn run_with<F>(&self, mem: &mut Mem, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let slab = mem.take().unwrap_or_else(Slab::alloc);
        // SAFETY: `slab` is either fresh or was reclaimed by a prior call's
        // `continue_with`, which only ever returns a slab whose action has
        // already been consumed.
        let node = unsafe { Node::init(slab, action) };

        let prev = self.tail.swap(node, Ordering::AcqRel);
        // SAFETY: `prev` was the chain's tail and is therefore still
        // allocated; `node` was just published and is reachable from no
        // other thread until this exchange.
        if let Some(freed) = unsafe { Node::continue_with(prev, node) } {
            mem.store(freed);
        }
    }
}

impl Default for ActionChain {
    fn default() -> Self {
        ActionChain::new()
    }
}

impl Drop for ActionChain {
    /// Frees the current tail node.
    ///
    /// The caller must ensure no `run`/`run_with` call overlaps with
    /// destruction and that no action is in flight; a quiescent chain's
    /// tail is always fully executed and sealed, so this never invokes an
    /// action, it only frees the slab.
    fn drop(&mut self) {
        let tail = *self.tail.get_mut();
        // SAFETY: quiescence (required by the caller) guarantees `tail`'s
        // action has already run and nothing else can still be accessing
        // the node.
        unsafe { Slab::from_node_ptr(tail).dealloc() };
    }
}

// The only shared mutable state is `tail`, an atomic, and each node's
// atomic `next`; both are safe to touch from any thread.
unsafe impl Send for ActionChain {}
unsafe impl Sync for ActionChain {}
