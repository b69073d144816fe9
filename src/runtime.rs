//! Runtime - render entry point, dirty scheduling and the flush loop.
//!
//! A [`Runtime`] owns the live instance tree for one target node. State
//! setters and effects do not touch the DOM themselves; they mark their
//! owning component dirty on the runtime's [`Shared`] state, and the flush
//! loop re-renders exactly the dirty subtrees, commits the DOM mutations,
//! then runs the effects those renders queued. Effects that set state feed
//! the next iteration of the same flush, so a whole cascade settles within
//! one [`Runtime::render`] or event dispatch.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::context::Env;
use crate::descriptor::Children;
use crate::dom::{to_html, Document, DocumentRef};
use crate::effects::{run_effects, PendingEffect};
use crate::renderer::{reconcile_children, rerender_dirty, Instance, Pass};
use crate::types::{Event, EventKind, InstanceId, NodeId};

/// A flush that does not settle within this many passes is a state/effect
/// cycle that will never converge.
const MAX_FLUSH_PASSES: usize = 1000;

// =============================================================================
// Shared Scheduler State
// =============================================================================

struct SharedInner {
    /// Dirty component instances in mark order, deduplicated.
    dirty: VecDeque<InstanceId>,
    /// Effects queued by renders since the last drain, in call order.
    effects: Vec<PendingEffect>,
    next_instance: u64,
}

/// Scheduler state shared between the runtime and every live `Setter`.
#[derive(Clone)]
pub(crate) struct Shared(Rc<RefCell<SharedInner>>);

impl Shared {
    pub(crate) fn new() -> Self {
        Shared(Rc::new(RefCell::new(SharedInner {
            dirty: VecDeque::new(),
            effects: Vec::new(),
            next_instance: 0,
        })))
    }

    pub(crate) fn alloc_instance(&self) -> InstanceId {
        let mut inner = self.0.borrow_mut();
        let id = InstanceId(inner.next_instance);
        inner.next_instance += 1;
        id
    }

    pub(crate) fn mark_dirty(&self, id: InstanceId) {
        let mut inner = self.0.borrow_mut();
        if !inner.dirty.contains(&id) {
            inner.dirty.push_back(id);
        }
    }

    pub(crate) fn take_dirty(&self) -> Option<InstanceId> {
        self.0.borrow_mut().dirty.pop_front()
    }

    pub(crate) fn has_dirty(&self) -> bool {
        !self.0.borrow().dirty.is_empty()
    }

    /// Drop any pending dirty mark for an instance that just rendered or
    /// unmounted.
    pub(crate) fn forget(&self, id: InstanceId) {
        self.0.borrow_mut().dirty.retain(|d| *d != id);
    }

    pub(crate) fn queue_effect(&self, effect: PendingEffect) {
        self.0.borrow_mut().effects.push(effect);
    }

    pub(crate) fn take_effects(&self) -> Vec<PendingEffect> {
        std::mem::take(&mut self.0.borrow_mut().effects)
    }

    pub(crate) fn downgrade(&self) -> WeakShared {
        WeakShared(Rc::downgrade(&self.0))
    }
}

/// Weak handle held by setters, so state captured in long-lived closures
/// does not keep a dropped runtime's scheduler alive.
#[derive(Clone)]
pub(crate) struct WeakShared(Weak<RefCell<SharedInner>>);

impl WeakShared {
    /// Best effort: a set on a dead runtime updates the cell but schedules
    /// nothing.
    pub(crate) fn mark_dirty(&self, id: InstanceId) {
        if let Some(inner) = self.0.upgrade() {
            Shared(inner).mark_dirty(id);
        }
    }
}

// =============================================================================
// Runtime
// =============================================================================

/// Owns the live tree rendered into one target node of a document.
pub struct Runtime {
    doc: DocumentRef,
    target: NodeId,
    roots: Vec<Instance>,
    shared: Shared,
}

impl Runtime {
    /// Render into `target` of an existing document.
    pub fn new(doc: DocumentRef, target: NodeId) -> Self {
        Runtime {
            doc,
            target,
            roots: Vec::new(),
            shared: Shared::new(),
        }
    }

    /// Fresh document with a `body` element as the target.
    pub fn with_body() -> Self {
        let doc = Document::new_shared();
        let target = doc.borrow_mut().create_element("body");
        Runtime::new(doc, target)
    }

    pub fn document(&self) -> &DocumentRef {
        &self.doc
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Serialize the target's subtree.
    pub fn html(&self) -> String {
        to_html(&self.doc.borrow(), self.target)
    }

    /// Reconcile `children` against the current tree, then flush.
    ///
    /// First call mounts; later calls diff against the previous render,
    /// preserving component state at matching positions.
    pub fn render(&mut self, children: impl Into<Children>) {
        let descriptors = children.into().0;
        let pass = Pass {
            doc: &self.doc,
            shared: &self.shared,
        };
        let old = std::mem::take(&mut self.roots);
        let (roots, _) =
            reconcile_children(&pass, self.target, 0, old, descriptors, &Env::new());
        self.roots = roots;
        self.flush();
    }

    /// Drain the dirty set and effect queue until both are empty.
    ///
    /// Each pass re-renders every currently dirty subtree (so several state
    /// updates from one event handler commit as a single DOM pass), then
    /// runs the effects those renders queued. Effects setting state start
    /// the next pass.
    pub fn flush(&mut self) {
        for _ in 0..MAX_FLUSH_PASSES {
            while let Some(id) = self.shared.take_dirty() {
                let pass = Pass {
                    doc: &self.doc,
                    shared: &self.shared,
                };
                // False means the instance unmounted after being marked.
                let _ = rerender_dirty(&pass, &mut self.roots, self.target, id);
            }
            let effects = self.shared.take_effects();
            if effects.is_empty() && !self.shared.has_dirty() {
                return;
            }
            run_effects(effects);
        }
        panic!("flush did not settle after {MAX_FLUSH_PASSES} passes: an effect or event handler sets state on every render");
    }

    /// Deliver an event to the listeners registered on `node`, then flush.
    pub fn dispatch(&mut self, node: NodeId, event: Event) {
        let listeners = self.doc.borrow().listeners(node, event.kind);
        for listener in listeners {
            listener(&event);
        }
        self.flush();
    }

    /// Dispatch a click on `node`.
    pub fn click(&mut self, node: NodeId) {
        self.dispatch(node, Event::new(node, EventKind::Click));
    }

    /// Dispatch an input event carrying `value`.
    pub fn input(&mut self, node: NodeId, value: &str) {
        let mut event = Event::new(node, EventKind::Input);
        event.value = Some(value.to_string());
        self.dispatch(node, event);
    }

    /// Tear down the whole tree: effect cleanups bottom-up, refs cleared,
    /// DOM released.
    pub fn unmount(&mut self) {
        for root in std::mem::take(&mut self.roots) {
            root.unmount(&self.doc, &self.shared, self.target);
        }
        self.flush();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{component, h, Attrs};
    use crate::hooks::Ctx;

    fn body_text(rt: &Runtime) -> String {
        let doc = rt.doc.borrow();
        doc.text_content(rt.target)
    }

    #[test]
    fn test_render_static_tree() {
        let mut rt = Runtime::with_body();
        rt.render(h("p", Attrs::new().class("red"), "hello"));
        assert_eq!(rt.html(), "<body><p class=\"red\">hello</p></body>");
    }

    #[test]
    fn test_rerender_updates_in_place() {
        let mut rt = Runtime::with_body();
        rt.render(h("p", Attrs::new(), "one"));
        let node_count = rt.doc.borrow().node_count();

        rt.render(h("p", Attrs::new(), "two"));
        assert_eq!(body_text(&rt), "two");
        // Same element and text node, only the content changed.
        assert_eq!(rt.doc.borrow().node_count(), node_count);
    }

    #[test]
    fn test_click_rerenders_component() {
        fn counter(ctx: &mut Ctx, _props: &()) -> crate::descriptor::Children {
            let (count, set) = ctx.use_state(|| 0i64);
            h(
                "button",
                Attrs::new().id("b").on_click(move |_| set.update(|c| c + 1)),
                format!("clicks: {count}"),
            )
            .into()
        }

        let mut rt = Runtime::with_body();
        rt.render(component(counter, ()));
        assert_eq!(body_text(&rt), "clicks: 0");

        let button = rt.doc.borrow().get_element_by_id("b").unwrap();
        rt.click(button);
        assert_eq!(body_text(&rt), "clicks: 1");
        rt.click(button);
        assert_eq!(body_text(&rt), "clicks: 2");
    }

    #[test]
    fn test_two_sets_in_one_handler_commit_once() {
        fn pair(ctx: &mut Ctx, _props: &()) -> crate::descriptor::Children {
            let (a, set_a) = ctx.use_state(|| 0i64);
            let (b, set_b) = ctx.use_state(|| 0i64);
            h(
                "button",
                Attrs::new().id("b").on_click(move |_| {
                    set_a.update(|v| v + 1);
                    set_b.update(|v| v + 1);
                }),
                format!("{a},{b}"),
            )
            .into()
        }

        let mut rt = Runtime::with_body();
        rt.render(component(pair, ()));
        let button = rt.doc.borrow().get_element_by_id("b").unwrap();

        rt.doc.borrow_mut().reset_mutation_stats();
        rt.click(button);
        assert_eq!(body_text(&rt), "1,1");
        // One pass: a single text write plus the listener rewrite. An
        // unbatched runtime would render twice and double both.
        assert_eq!(rt.doc.borrow().mutation_count(), 2);
    }

    #[test]
    fn test_set_to_equal_value_mutates_nothing() {
        fn fixed(ctx: &mut Ctx, _props: &()) -> crate::descriptor::Children {
            let (v, set) = ctx.use_state(|| 7i64);
            h(
                "button",
                Attrs::new().id("b").on_click(move |_| set.set(7)),
                format!("{v}"),
            )
            .into()
        }

        let mut rt = Runtime::with_body();
        rt.render(component(fixed, ()));
        let button = rt.doc.borrow().get_element_by_id("b").unwrap();

        rt.doc.borrow_mut().reset_mutation_stats();
        rt.click(button);
        assert_eq!(rt.doc.borrow().mutation_count(), 0);
    }

    #[test]
    fn test_effect_setting_state_settles_in_same_flush() {
        fn sync(ctx: &mut Ctx, _props: &()) -> crate::descriptor::Children {
            let (v, set) = ctx.use_state(|| 0i64);
            let target = 3i64;
            let current = *v;
            ctx.use_effect((current,), move || {
                if current < target {
                    set.set(current + 1);
                }
            });
            h("p", Attrs::new(), format!("{v}")).into()
        }

        let mut rt = Runtime::with_body();
        rt.render(component(sync, ()));
        assert_eq!(body_text(&rt), "3");
    }

    #[test]
    fn test_unmount_releases_nodes() {
        let mut rt = Runtime::with_body();
        rt.render(h(
            "div",
            Attrs::new(),
            vec![h("p", Attrs::new(), "a"), h("p", Attrs::new(), "b")],
        ));
        rt.unmount();
        assert_eq!(rt.html(), "<body></body>");
        // Only the body remains live.
        assert_eq!(rt.doc.borrow().node_count(), 1);
    }
}
