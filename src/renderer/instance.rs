//! Live instance tree.
//!
//! An [`Instance`] is the runtime counterpart of a [`Descriptor`]: one per
//! live tree position. Host and text instances own their DOM node; component
//! instances own their hook store, the props and environment of their last
//! render, and the instances they rendered. Fragments and providers are
//! transparent - their children splice into the nearest host ancestor's
//! child list.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::rc::Rc;

use crate::context::{ContextId, Env};
use crate::descriptor::{Attrs, Children, Descriptor, Kind};
use crate::dom::DocumentRef;
use crate::hooks::{Ctx, HookStore};
use crate::runtime::Shared;
use crate::types::{InstanceId, NodeId};

pub(crate) struct HostInstance {
    pub node: NodeId,
    pub tag: String,
    /// Attributes as last applied, the baseline for the next diff.
    pub attrs: Attrs,
    pub children: Vec<Instance>,
    pub key: Option<String>,
}

pub(crate) struct TextInstance {
    pub node: NodeId,
    pub content: String,
    pub key: Option<String>,
}

pub(crate) struct ComponentInstance {
    pub id: InstanceId,
    pub type_id: TypeId,
    pub name: &'static str,
    pub props: Rc<dyn Any>,
    pub render: Rc<dyn Fn(&mut Ctx, &dyn Any) -> Children>,
    pub hooks: Rc<RefCell<HookStore>>,
    /// Environment snapshot of the last render, reused by local re-renders.
    pub env: Env,
    pub rendered: Vec<Instance>,
    pub key: Option<String>,
}

pub(crate) struct GroupInstance {
    pub children: Vec<Instance>,
    pub key: Option<String>,
}

pub(crate) struct ProviderInstance {
    pub context: ContextId,
    pub value: Rc<dyn Any>,
    pub children: Vec<Instance>,
    pub key: Option<String>,
}

pub(crate) enum Instance {
    Host(HostInstance),
    Text(TextInstance),
    Component(ComponentInstance),
    Fragment(GroupInstance),
    Provider(ProviderInstance),
}

impl Instance {
    pub(crate) fn key(&self) -> Option<&str> {
        match self {
            Instance::Host(h) => h.key.as_deref(),
            Instance::Text(t) => t.key.as_deref(),
            Instance::Component(c) => c.key.as_deref(),
            Instance::Fragment(g) => g.key.as_deref(),
            Instance::Provider(p) => p.key.as_deref(),
        }
    }

    /// Update-in-place is allowed only when the descriptor's kind matches.
    pub(crate) fn matches(&self, desc: &Descriptor) -> bool {
        match (self, &desc.kind) {
            (Instance::Host(h), Kind::Host(tag)) => h.tag == *tag,
            (Instance::Text(_), Kind::Text(_)) => true,
            (Instance::Component(c), Kind::Component(d)) => c.type_id == d.type_id,
            (Instance::Provider(p), Kind::Provider { context, .. }) => p.context == *context,
            (Instance::Fragment(_), Kind::Fragment) => true,
            _ => false,
        }
    }

    /// DOM nodes this instance contributes directly to its host parent's
    /// child list (transparent instances recurse).
    pub(crate) fn top_nodes(&self, out: &mut Vec<NodeId>) {
        match self {
            Instance::Host(h) => out.push(h.node),
            Instance::Text(t) => out.push(t.node),
            Instance::Component(c) => {
                for child in &c.rendered {
                    child.top_nodes(out);
                }
            }
            Instance::Fragment(g) => {
                for child in &g.children {
                    child.top_nodes(out);
                }
            }
            Instance::Provider(p) => {
                for child in &p.children {
                    child.top_nodes(out);
                }
            }
        }
    }

    /// Unmount: run every effect cleanup in the subtree (children first,
    /// each instance's cleanups in reverse registration order), clear node
    /// refs, then detach and release this instance's DOM from `parent`.
    pub(crate) fn unmount(mut self, doc: &DocumentRef, shared: &Shared, parent: NodeId) {
        let mut tops = Vec::new();
        self.top_nodes(&mut tops);

        self.teardown(shared);

        let mut d = doc.borrow_mut();
        for node in tops {
            d.remove_child(parent, node);
            d.release(node);
        }
    }

    /// Cleanups and ref clearing, bottom-up, with no DOM ops.
    fn teardown(&mut self, shared: &Shared) {
        match self {
            Instance::Host(h) => {
                for child in &mut h.children {
                    child.teardown(shared);
                }
                if let Some(r) = &h.attrs.node_ref {
                    r.set(None);
                }
            }
            Instance::Text(_) => {}
            Instance::Component(c) => {
                for child in &mut c.rendered {
                    child.teardown(shared);
                }
                let cleanups = c.hooks.borrow_mut().drain_cleanups();
                for cleanup in cleanups {
                    cleanup();
                }
                shared.forget(c.id);
            }
            Instance::Fragment(g) => {
                for child in &mut g.children {
                    child.teardown(shared);
                }
            }
            Instance::Provider(p) => {
                for child in &mut p.children {
                    child.teardown(shared);
                }
            }
        }
    }
}
