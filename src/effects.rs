//! Effect scheduler - deferred side effects after DOM commit.
//!
//! Effects registered during a render pass never run inside the component
//! body. They queue up in registration order (parent before children,
//! matching render order) and flush once the reconciler has applied every
//! DOM mutation for the pass.
//!
//! Ordering guarantees:
//! - before an effect re-runs with changed dependencies, its previous
//!   cleanup (if one was returned) runs first,
//! - effects of one pass all complete before the next pass's effects run,
//! - on unmount, an instance's cleanups run in reverse registration order,
//!   before its DOM is detached (see `renderer::instance`).
//!
//! A panic inside an effect propagates out of the flush and drops the
//! remaining queued effects of that flush. Documented policy, not a bug:
//! there is no error boundary.

use std::cell::RefCell;
use std::rc::Weak;

use crate::hooks::HookStore;
use crate::types::Cleanup;

/// One queued effect invocation.
///
/// Holds the owning instance's hook store weakly: if the instance unmounts
/// before the flush reaches this entry, the entry is skipped (the effect
/// never observed a committed DOM, so it never runs - and its slot's
/// cleanups already ran during unmount).
pub(crate) struct PendingEffect {
    pub hooks: Weak<RefCell<HookStore>>,
    pub slot: usize,
    pub run: Box<dyn FnOnce() -> Option<Cleanup>>,
}

/// Run a drained effect queue.
///
/// For each live entry: take the slot's previous cleanup, run it, run the
/// effect, store the returned cleanup back. If the effect unmounted its own
/// instance (the store is gone afterwards), the fresh cleanup runs
/// immediately instead of leaking.
pub(crate) fn run_effects(pending: Vec<PendingEffect>) {
    for entry in pending {
        let Some(store) = entry.hooks.upgrade() else {
            continue;
        };

        let previous = store.borrow_mut().take_cleanup(entry.slot);
        if let Some(cleanup) = previous {
            cleanup();
        }

        let next = (entry.run)();

        match entry.hooks.upgrade() {
            Some(store) => store.borrow_mut().store_cleanup(entry.slot, next),
            None => {
                if let Some(cleanup) = next {
                    cleanup();
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn store_with_effect_slot() -> Rc<RefCell<HookStore>> {
        use crate::context::Env;
        use crate::hooks::Ctx;
        use crate::runtime::Shared;
        use crate::types::InstanceId;

        let shared = Shared::new();
        let store = Rc::new(RefCell::new(HookStore::new()));
        let mut ctx = Ctx::new(store.clone(), Env::new(), InstanceId(0), shared.clone());
        ctx.use_effect((), || {});
        // Discard the queued entry; tests build their own.
        let _ = shared.take_effects();
        store
    }

    #[test]
    fn test_effect_runs_and_stores_cleanup() {
        let store = store_with_effect_slot();
        let ran = Rc::new(Cell::new(false));
        let ran_clone = ran.clone();

        run_effects(vec![PendingEffect {
            hooks: Rc::downgrade(&store),
            slot: 0,
            run: Box::new(move || {
                ran_clone.set(true);
                Some(Box::new(|| {}))
            }),
        }]);

        assert!(ran.get());
        assert!(store.borrow_mut().take_cleanup(0).is_some());
    }

    #[test]
    fn test_previous_cleanup_runs_before_rerun() {
        let store = store_with_effect_slot();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o = order.clone();
        store
            .borrow_mut()
            .store_cleanup(0, Some(Box::new(move || o.borrow_mut().push("cleanup"))));

        let o = order.clone();
        run_effects(vec![PendingEffect {
            hooks: Rc::downgrade(&store),
            slot: 0,
            run: Box::new(move || {
                o.borrow_mut().push("effect");
                None
            }),
        }]);

        assert_eq!(*order.borrow(), vec!["cleanup", "effect"]);
    }

    #[test]
    fn test_unmounted_instance_is_skipped() {
        let store = store_with_effect_slot();
        let weak = Rc::downgrade(&store);
        drop(store);

        let ran = Rc::new(Cell::new(false));
        let ran_clone = ran.clone();

        run_effects(vec![PendingEffect {
            hooks: weak,
            slot: 0,
            run: Box::new(move || {
                ran_clone.set(true);
                None
            }),
        }]);

        assert!(!ran.get());
    }
}
