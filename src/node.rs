//! The handoff state machine. Everything that makes the chain lock-free and
//! wait-free for the producer lives here: the two-state encoding of `next`,
//! and the rule that the thread which *observes* a `SEALED` pointer — never
//! the one that *writes* it — is the one that frees the node.

use std::ptr;

use crate::mem::Slab;
use crate::sync::{AtomicPtr, Ordering};

/// A distinguished, non-null, never-dereferenced bit pattern used for the
/// sealed state of `next`. Any fixed address works as long as it can never
/// coincide with a real slab allocation; a dedicated static with an
/// over-aligned marker type does that cheaply and without `unsafe`
/// transmutes of integers to pointers.
#[repr(align(16))]
struct SealedTag;

static SEALED_TAG: SealedTag = SealedTag;

#[inline]
fn sealed_ptr() -> *mut Node {
    (&SEALED_TAG as *const SealedTag).cast::<Node>().cast_mut()
}

/// One pending or in-flight action.
///
/// `Node` never owns its own storage: it is always the first field of a
/// [`Slab`], with the action's bytes immediately following it in the same
/// allocation. `invoke` is the one piece of compile-time polymorphism this
/// crate needs — a function pointer generated per action type that knows
/// how to read the action back out of the trailer, run it, and (by virtue
/// of calling it by value) drop it.
#[repr(C)]
pub(crate) struct Node {
    pub(crate) next: AtomicPtr<Node>,
    invoke: unsafe fn(*mut Node),
}

unsafe fn invoke_thunk<F>(node: *mut Node)
where
    F: FnOnce() + Send + 'static,
{
    let slab = Slab::from_node_ptr(node);
    // SAFETY: `init::<F>` wrote exactly one live `F` at this offset, and
    // the handoff protocol guarantees `invoke` is called at most once per
    // node, so reading it out by value here does not double-run or alias
    // a later read.
    let action = ptr::read(slab.payload_ptr::<F>());
    action();
}

impl Node {
    /// Builds a node in place inside `slab`, embedding `action` in its
    /// trailer, with `next` starting at `NULL`.
    ///
    /// # Safety
    /// `slab` must be a fresh, unused allocation (from [`Slab::alloc`] or
    /// recycled out of a [`Mem`](crate::mem::Mem)) that the caller will not
    /// reuse until the returned node has run through the handoff protocol
    /// and its slab has been reclaimed.
    pub(crate) unsafe fn init<F>(slab: Slab, action: F) -> *mut Node
    where
        F: FnOnce() + Send + 'static,
    {
        let _ = crate::mem::AssertFits::<F>::CHECK;
        let node_ptr = slab.as_node_ptr();
        node_ptr.write(Node {
            next: AtomicPtr::new(ptr::null_mut()),
            invoke: invoke_thunk::<F>,
        });
        slab.payload_ptr::<F>().write(action);
        node_ptr
    }

    /// Runs `node`'s action exactly once. Callers must ensure this is never
    /// invoked twice for the same node and never races another call to
    /// `invoke` on the same node.
    #[inline]
    unsafe fn invoke(node: *mut Node) {
        ((*node).invoke)(node);
    }

    /// Called by a producer on its predecessor, `prev`, immediately after
    /// publishing `next` into the chain's `tail`.
    ///
    /// Returns the predecessor's slab if this call also took over draining
    /// duty (meaning `prev` had already been fully executed and sealed by
    /// an executor), or `None` if an executor is still responsible for
    /// `prev` and will discover `next` on its own.
    ///
    /// # Safety
    /// `prev` must be a previously-published, still-allocated node; `next`
    /// must be a freshly initialized node not yet reachable from any other
    /// thread.
    pub(crate) unsafe fn continue_with(prev: *mut Node, next: *mut Node) -> Option<Slab> {
        let old = (*prev).next.swap(next, Ordering::AcqRel);
        if old.is_null() {
            None
        } else {
            debug_assert_eq!(old, sealed_ptr(), "next transitioned out of order");
            Node::run_all(next);
            Some(Slab::from_node_ptr(prev))
        }
    }

    /// Drains the chain starting at `w`, which must not yet have been
    /// executed. Runs `w`'s action, then each successor's in turn, for as
    /// long as a successor is already linked by the time this node is
    /// sealed; frees every node it drains through except the last.
    ///
    /// # Safety
    /// `w` must be non-null, not yet invoked, and not concurrently invoked
    /// or drained by any other thread.
    pub(crate) unsafe fn run_all(mut w: *mut Node) {
        loop {
            Node::invoke(w);
            let old = (*w).next.swap(sealed_ptr(), Ordering::AcqRel);
            if old.is_null() {
                // Relinquished: no producer had linked a successor by the
                // time we sealed. `w` stays allocated; whichever producer
                // later observes SEALED here owns destroying it.
                return;
            }
            debug_assert_ne!(old, sealed_ptr(), "next sealed twice");
            // A successor raced in before we sealed. We own `w`'s
            // destruction (no Mem is reachable from an executor loop, so
            // its slab is freed, not recycled) and continue draining.
            Slab::from_node_ptr(w).dealloc();
            w = old;
        }
    }
}
