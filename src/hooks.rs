//! Hook slot store - persistent per-instance state across renders.
//!
//! Every component instance owns an ordered sequence of hook slots. The
//! nth hook call in a render pass always lands on the nth slot, which is
//! how `use_state` hands back the same state cell render after render.
//!
//! # Contract
//!
//! A component must call hooks in the same order and count on every
//! render. Calling a hook conditionally, or in a loop whose iteration
//! count varies, shifts the cursor and corrupts the slot-to-meaning
//! mapping. The store panics with a descriptive message when the slot
//! tag at the cursor disagrees with the call - a best-effort diagnosis,
//! not a recovery.
//!
//! # No ambient render pointer
//!
//! Hooks are methods on an explicit [`Ctx`] handle the reconciler passes
//! into every component invocation. There is no hidden "currently
//! rendering component" global.

use std::any::Any;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::context::{Context, ContextId, Env};
use crate::effects::PendingEffect;
use crate::runtime::{Shared, WeakShared};
use crate::types::{Cleanup, ElementRef, InstanceId};

// =============================================================================
// Hook Slots
// =============================================================================

/// One persistent slot, tagged by the hook primitive that owns it.
pub(crate) enum HookSlot {
    State {
        /// Shared with every [`Setter`] handed out for this slot.
        cell: Rc<RefCell<Rc<dyn Any>>>,
    },
    Ref {
        cell: Rc<dyn Any>,
    },
    Memo {
        value: Rc<dyn Any>,
        deps: Rc<dyn Any>,
    },
    Effect {
        deps: EffectDeps,
        cleanup: Option<Cleanup>,
    },
    ContextRead {
        id: ContextId,
    },
}

impl HookSlot {
    fn kind_name(&self) -> &'static str {
        match self {
            HookSlot::State { .. } => "use_state",
            HookSlot::Ref { .. } => "use_ref",
            HookSlot::Memo { .. } => "use_memo",
            HookSlot::Effect { .. } => "use_effect",
            HookSlot::ContextRead { .. } => "use_context",
        }
    }
}

/// Dependency record of an effect slot.
pub(crate) enum EffectDeps {
    /// Registered with no dependency list: runs after every render.
    Always,
    /// Runs when any element of the list changed since the last run.
    List(Rc<dyn Any>),
}

/// Ordered hook storage for one component instance.
#[derive(Default)]
pub struct HookStore {
    slots: Vec<HookSlot>,
    cursor: usize,
}

impl HookStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Reset the cursor for a fresh render pass.
    pub(crate) fn begin(&mut self) {
        self.cursor = 0;
    }

    /// Take the stored cleanup of an effect slot, if any.
    pub(crate) fn take_cleanup(&mut self, slot: usize) -> Option<Cleanup> {
        match self.slots.get_mut(slot) {
            Some(HookSlot::Effect { cleanup, .. }) => cleanup.take(),
            _ => None,
        }
    }

    /// Store a cleanup into an effect slot.
    pub(crate) fn store_cleanup(&mut self, slot: usize, cleanup: Option<Cleanup>) {
        if let Some(HookSlot::Effect { cleanup: c, .. }) = self.slots.get_mut(slot) {
            *c = cleanup;
        }
    }

    /// Drain every stored effect cleanup, in reverse registration order.
    ///
    /// Called on unmount, before the instance's DOM is detached.
    pub(crate) fn drain_cleanups(&mut self) -> Vec<Cleanup> {
        let mut cleanups = Vec::new();
        for slot in self.slots.iter_mut().rev() {
            if let HookSlot::Effect { cleanup, .. } = slot {
                if let Some(c) = cleanup.take() {
                    cleanups.push(c);
                }
            }
        }
        cleanups
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

#[cold]
fn hook_order_panic(expected: &'static str, found: &'static str, slot: usize) -> ! {
    panic!(
        "hook order violation at slot {slot}: this render called {expected} where the \
         previous render called {found}; a component must call hooks in the same order \
         and count on every render"
    )
}

// =============================================================================
// Dependency Lists
// =============================================================================

/// A shallow-comparable dependency list.
///
/// Implemented for `()` (empty list: the effect or memo never re-runs
/// after the first render) and for tuples of `PartialEq` values up to
/// eight elements, compared element-wise against the previous render's
/// list. A list whose type changed between renders counts as changed.
pub trait DepList: 'static {
    /// True when any element differs from the previous list.
    fn changed(&self, prev: &dyn Any) -> bool;
}

impl DepList for () {
    fn changed(&self, _prev: &dyn Any) -> bool {
        false
    }
}

macro_rules! impl_dep_list {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: PartialEq + 'static),+> DepList for ($($name,)+) {
            fn changed(&self, prev: &dyn Any) -> bool {
                match prev.downcast_ref::<Self>() {
                    Some(prev) => $(self.$idx != prev.$idx)||+,
                    None => true,
                }
            }
        }
    };
}

impl_dep_list!(A: 0);
impl_dep_list!(A: 0, B: 1);
impl_dep_list!(A: 0, B: 1, C: 2);
impl_dep_list!(A: 0, B: 1, C: 2, D: 3);
impl_dep_list!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_dep_list!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_dep_list!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
impl_dep_list!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);

// =============================================================================
// State Setter
// =============================================================================

/// Updates a state slot and schedules a re-render of the owning instance.
///
/// Setting a value equal to the current one is a bail-out: the slot keeps
/// its value and no re-render is scheduled. Setters stay valid after the
/// runtime is gone; they just stop scheduling.
pub struct Setter<T> {
    cell: Rc<RefCell<Rc<dyn Any>>>,
    owner: InstanceId,
    shared: WeakShared,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            owner: self.owner,
            shared: self.shared.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: PartialEq + 'static> Setter<T> {
    /// Replace the state value unless it equals the current one.
    pub fn set(&self, next: T) {
        {
            let current = self.cell.borrow();
            if let Some(cur) = current.downcast_ref::<T>() {
                if *cur == next {
                    return;
                }
            }
        }
        *self.cell.borrow_mut() = Rc::new(next);
        self.shared.mark_dirty(self.owner);
    }

    /// Replace the state value by applying `f` to the current one.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let current = self.cell.borrow().clone();
        let cur = current
            .downcast_ref::<T>()
            .expect("state slot holds a different type than this setter");
        self.set(f(cur));
    }
}

// =============================================================================
// Mutable Refs
// =============================================================================

/// Stable mutable cell returned by [`Ctx::use_ref`].
///
/// The cell itself persists identically across renders; only its contents
/// change.
pub struct RefHandle<T>(Rc<RefCell<T>>);

impl<T> Clone for RefHandle<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> RefHandle<T> {
    /// Replace the contents.
    pub fn set(&self, value: T) {
        *self.0.borrow_mut() = value;
    }

    /// Read through a closure without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.borrow())
    }

    /// Mutate through a closure.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }
}

impl<T: Clone> RefHandle<T> {
    /// Clone the contents out.
    pub fn get(&self) -> T {
        self.0.borrow().clone()
    }
}

// =============================================================================
// Render Context
// =============================================================================

/// Explicit render context handed to a component function while the
/// reconciler invokes it.
///
/// All hook primitives live here. Calling them outside the invocation the
/// `Ctx` was created for is impossible by construction - the handle is
/// borrowed for the duration of the component body.
pub struct Ctx {
    store: Rc<RefCell<HookStore>>,
    env: Env,
    owner: InstanceId,
    shared: Shared,
}

impl Ctx {
    pub(crate) fn new(
        store: Rc<RefCell<HookStore>>,
        env: Env,
        owner: InstanceId,
        shared: Shared,
    ) -> Self {
        Self {
            store,
            env,
            owner,
            shared,
        }
    }

    /// Advance the cursor, returning the slot index for this hook call.
    fn next_slot(&self) -> usize {
        let mut store = self.store.borrow_mut();
        let idx = store.cursor;
        store.cursor += 1;
        idx
    }

    fn slot_is_new(&self, idx: usize) -> bool {
        self.store.borrow().slots.len() == idx
    }

    fn check_slot(&self, idx: usize, expected: &'static str) {
        let store = self.store.borrow();
        let found = store.slots[idx].kind_name();
        if found != expected {
            drop(store);
            hook_order_panic(expected, found, idx);
        }
    }

    // -------------------------------------------------------------------------
    // use_state
    // -------------------------------------------------------------------------

    /// Persistent state slot.
    ///
    /// `init` runs only on the first render. Returns the current value and
    /// a [`Setter`] that schedules a re-render of this instance's subtree
    /// (unless the new value equals the current one).
    pub fn use_state<T, F>(&mut self, init: F) -> (Rc<T>, Setter<T>)
    where
        T: PartialEq + 'static,
        F: FnOnce() -> T,
    {
        let idx = self.next_slot();
        if self.slot_is_new(idx) {
            let cell: Rc<RefCell<Rc<dyn Any>>> = Rc::new(RefCell::new(Rc::new(init())));
            self.store.borrow_mut().slots.push(HookSlot::State { cell });
        }
        self.check_slot(idx, "use_state");

        let cell = match &self.store.borrow().slots[idx] {
            HookSlot::State { cell } => cell.clone(),
            _ => unreachable!(),
        };
        let value = cell
            .borrow()
            .clone()
            .downcast::<T>()
            .unwrap_or_else(|_| {
                panic!("use_state at slot {idx} called with a different type than the previous render")
            });
        let setter = Setter {
            cell,
            owner: self.owner,
            shared: self.shared.downgrade(),
            _marker: PhantomData,
        };
        (value, setter)
    }

    // -------------------------------------------------------------------------
    // use_ref
    // -------------------------------------------------------------------------

    /// Stable mutable cell, identical across renders.
    pub fn use_ref<T: 'static>(&mut self, init: impl FnOnce() -> T) -> RefHandle<T> {
        let idx = self.next_slot();
        if self.slot_is_new(idx) {
            let cell: Rc<dyn Any> = Rc::new(RefCell::new(init()));
            self.store.borrow_mut().slots.push(HookSlot::Ref { cell });
        }
        self.check_slot(idx, "use_ref");

        let cell = match &self.store.borrow().slots[idx] {
            HookSlot::Ref { cell } => cell.clone(),
            _ => unreachable!(),
        };
        let cell = cell.downcast::<RefCell<T>>().unwrap_or_else(|_| {
            panic!("use_ref at slot {idx} called with a different type than the previous render")
        });
        RefHandle(cell)
    }

    /// Stable [`ElementRef`] for the `ref` attribute of a host element.
    pub fn use_node_ref(&mut self) -> ElementRef {
        self.use_ref(ElementRef::new).get()
    }

    // -------------------------------------------------------------------------
    // use_memo
    // -------------------------------------------------------------------------

    /// Cache a computation across renders.
    ///
    /// `compute` runs on the first render and again whenever an element of
    /// `deps` differs from the previous render's list.
    pub fn use_memo<T, D>(&mut self, deps: D, compute: impl FnOnce() -> T) -> Rc<T>
    where
        T: 'static,
        D: DepList,
    {
        let idx = self.next_slot();
        if self.slot_is_new(idx) {
            let value: Rc<dyn Any> = Rc::new(compute());
            self.store.borrow_mut().slots.push(HookSlot::Memo {
                value,
                deps: Rc::new(deps),
            });
            return self.memo_value(idx);
        }
        self.check_slot(idx, "use_memo");

        let stale = match &self.store.borrow().slots[idx] {
            HookSlot::Memo { deps: prev, .. } => deps.changed(prev.as_ref()),
            _ => unreachable!(),
        };
        if stale {
            let value: Rc<dyn Any> = Rc::new(compute());
            if let HookSlot::Memo { value: v, deps: d } = &mut self.store.borrow_mut().slots[idx] {
                *v = value;
                *d = Rc::new(deps);
            }
        }
        self.memo_value(idx)
    }

    fn memo_value<T: 'static>(&self, idx: usize) -> Rc<T> {
        match &self.store.borrow().slots[idx] {
            HookSlot::Memo { value, .. } => value.clone().downcast::<T>().unwrap_or_else(|_| {
                panic!("use_memo at slot {idx} called with a different type than the previous render")
            }),
            _ => unreachable!(),
        }
    }

    // -------------------------------------------------------------------------
    // use_effect
    // -------------------------------------------------------------------------

    /// Register a side effect that runs after the DOM commits.
    ///
    /// With `()` deps the effect runs once, after first mount. With a tuple
    /// it re-runs whenever an element differs from the previous render.
    pub fn use_effect<D: DepList>(&mut self, deps: D, f: impl FnOnce() + 'static) {
        self.effect_slot(
            Some(deps),
            Box::new(move || {
                f();
                None
            }),
        );
    }

    /// [`use_effect`](Self::use_effect) returning a cleanup, run before the
    /// effect re-runs and once more at unmount.
    pub fn use_effect_with<D: DepList>(&mut self, deps: D, f: impl FnOnce() -> Cleanup + 'static) {
        self.effect_slot(Some(deps), Box::new(move || Some(f())));
    }

    /// Effect with no dependency list: runs after every render of the
    /// owning instance.
    pub fn use_effect_always(&mut self, f: impl FnOnce() + 'static) {
        self.effect_slot(
            None::<()>,
            Box::new(move || {
                f();
                None
            }),
        );
    }

    /// Shared slot bookkeeping for the `use_effect` family.
    ///
    /// `deps: None` means "no dependency list" (run after every render).
    /// The comparison happens here, while the tuple type is still concrete;
    /// the slot stores the list type-erased.
    fn effect_slot<D: DepList>(
        &mut self,
        deps: Option<D>,
        run: Box<dyn FnOnce() -> Option<Cleanup>>,
    ) {
        let idx = self.next_slot();
        let first = self.slot_is_new(idx);

        let due = if first {
            let deps = match deps {
                Some(deps) => EffectDeps::List(Rc::new(deps)),
                None => EffectDeps::Always,
            };
            self.store.borrow_mut().slots.push(HookSlot::Effect {
                deps,
                cleanup: None,
            });
            true
        } else {
            self.check_slot(idx, "use_effect");
            let mut store = self.store.borrow_mut();
            let HookSlot::Effect { deps: prev, .. } = &mut store.slots[idx] else {
                unreachable!()
            };
            match deps {
                None => true,
                Some(deps) => {
                    let changed = match &*prev {
                        // Switching between the always and list forms is a
                        // contract violation; treat it as changed.
                        EffectDeps::Always => true,
                        EffectDeps::List(old) => deps.changed(old.as_ref()),
                    };
                    if changed {
                        *prev = EffectDeps::List(Rc::new(deps));
                    }
                    changed
                }
            }
        };

        if due {
            self.shared.queue_effect(PendingEffect {
                hooks: Rc::downgrade(&self.store),
                slot: idx,
                run,
            });
        }
    }

    // -------------------------------------------------------------------------
    // use_context
    // -------------------------------------------------------------------------

    /// Resolve the nearest enclosing provider value for `context`, or its
    /// default when no provider is active above this instance.
    pub fn use_context<T: 'static>(&mut self, context: &Context<T>) -> Rc<T> {
        let idx = self.next_slot();
        if self.slot_is_new(idx) {
            self.store.borrow_mut().slots.push(HookSlot::ContextRead {
                id: context.id(),
            });
        }
        self.check_slot(idx, "use_context");
        context.resolve(&self.env)
    }
}

// =============================================================================
// Tests
// =============================================================================
