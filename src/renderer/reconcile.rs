//! Reconciler - minimal DOM updates from descriptor trees.
//!
//! Per subtree position:
//! 1. no prior instance: **mount** (create DOM, invoke components fresh),
//! 2. prior instance of the same kind: **update in place** (attribute and
//!    listener diff, re-invoke components against their existing hook
//!    store),
//! 3. kind mismatch: **replace** (unmount old, mount new).
//!
//! Children match positionally by index and kind; children carrying an
//! explicit key match by key first, and unkeyed children in a mixed list
//! fall back to positional order among themselves. A shrinking or growing
//! unkeyed list mounts/unmounts only the trailing delta.
//!
//! Placement works on a `(parent, offset)` range of the nearest host
//! ancestor's child list, with transparent instances (components,
//! fragments, providers) consuming as many slots as their flattened output
//! produces. Reused nodes that already sit at their slot are not touched.

use std::collections::{HashMap, VecDeque};

use crate::context::Env;
use crate::descriptor::{Attrs, Descriptor, Kind};
use crate::dom::DocumentRef;
use crate::hooks::{Ctx, HookStore};
use crate::runtime::Shared;
use crate::types::{InstanceId, NodeId};

use super::instance::{
    ComponentInstance, GroupInstance, HostInstance, Instance, ProviderInstance, TextInstance,
};

use std::cell::RefCell;
use std::rc::Rc;

/// Borrowed handles a render pass works with.
pub(crate) struct Pass<'a> {
    pub doc: &'a DocumentRef,
    pub shared: &'a Shared,
}

// =============================================================================
// Child Reconciliation
// =============================================================================

/// Reconcile a child list into the `(parent, start)` range, returning the
/// new instances and the range width they occupy.
pub(crate) fn reconcile_children(
    pass: &Pass<'_>,
    parent: NodeId,
    start: usize,
    old: Vec<Instance>,
    new: Vec<Descriptor>,
    env: &Env,
) -> (Vec<Instance>, usize) {
    let (matched, leftovers) = pair_children(old, &new);

    // Unmount unmatched old children first so placement offsets see only
    // surviving nodes.
    for instance in leftovers {
        instance.unmount(pass.doc, pass.shared, parent);
    }

    let mut instances = Vec::with_capacity(new.len());
    let mut offset = start;
    for (desc, old_child) in new.into_iter().zip(matched) {
        let (instance, width) = reconcile_one(pass, parent, offset, old_child, desc, env);
        offset += width;
        instances.push(instance);
    }
    (instances, offset - start)
}

/// Pair each new descriptor with the old instance it should update.
///
/// Returns the pairing (index-aligned with `new`) and the unmatched old
/// instances, in their original order.
fn pair_children(
    old: Vec<Instance>,
    new: &[Descriptor],
) -> (Vec<Option<Instance>>, Vec<Instance>) {
    let keyed =
        new.iter().any(|d| d.key.is_some()) || old.iter().any(|i| i.key().is_some());

    if !keyed {
        // Pure positional matching: index i pairs with index i, the
        // trailing delta mounts or unmounts.
        let mut old_iter = old.into_iter();
        let matched = (0..new.len()).map(|_| old_iter.next()).collect();
        return (matched, old_iter.collect());
    }

    let mut slots: Vec<Option<Instance>> = old.into_iter().map(Some).collect();
    let mut by_key: HashMap<String, usize> = HashMap::new();
    let mut unkeyed: VecDeque<usize> = VecDeque::new();
    for (index, slot) in slots.iter().enumerate() {
        match slot.as_ref().and_then(|i| i.key()) {
            Some(key) => {
                by_key.insert(key.to_string(), index);
            }
            None => unkeyed.push_back(index),
        }
    }

    let matched = new
        .iter()
        .map(|desc| {
            let index = match &desc.key {
                Some(key) => by_key.remove(key),
                None => unkeyed.pop_front(),
            };
            index.and_then(|i| slots[i].take())
        })
        .collect();

    let leftovers = slots.into_iter().flatten().collect();
    (matched, leftovers)
}

fn reconcile_one(
    pass: &Pass<'_>,
    parent: NodeId,
    offset: usize,
    old: Option<Instance>,
    desc: Descriptor,
    env: &Env,
) -> (Instance, usize) {
    match old {
        Some(instance) if instance.matches(&desc) => {
            update(pass, parent, offset, instance, desc, env)
        }
        Some(instance) => {
            instance.unmount(pass.doc, pass.shared, parent);
            mount(pass, parent, offset, desc, env)
        }
        None => mount(pass, parent, offset, desc, env),
    }
}

// =============================================================================
// Mount
// =============================================================================

fn mount(
    pass: &Pass<'_>,
    parent: NodeId,
    offset: usize,
    desc: Descriptor,
    env: &Env,
) -> (Instance, usize) {
    match desc.kind {
        Kind::Host(tag) => {
            let node = {
                let mut doc = pass.doc.borrow_mut();
                let node = doc.create_element(&tag);
                for (name, value) in &desc.attrs.values {
                    doc.set_attribute(node, name.clone(), value.clone());
                }
                if !desc.attrs.listeners.is_empty() {
                    doc.set_listeners(node, desc.attrs.listeners.clone());
                }
                doc.insert_child(parent, offset, node);
                node
            };
            if let Some(r) = &desc.attrs.node_ref {
                r.set(Some(node));
            }
            let (children, _) = reconcile_children(pass, node, 0, Vec::new(), desc.children, env);
            (
                Instance::Host(HostInstance {
                    node,
                    tag,
                    attrs: desc.attrs,
                    children,
                    key: desc.key,
                }),
                1,
            )
        }
        Kind::Text(content) => {
            let node = {
                let mut doc = pass.doc.borrow_mut();
                let node = doc.create_text(&content);
                doc.insert_child(parent, offset, node);
                node
            };
            (
                Instance::Text(TextInstance {
                    node,
                    content,
                    key: desc.key,
                }),
                1,
            )
        }
        Kind::Component(comp) => {
            let id = pass.shared.alloc_instance();
            let hooks = Rc::new(RefCell::new(HookStore::new()));
            let out = invoke(pass, &hooks, env, id, &comp.render, comp.props.as_ref());
            let (rendered, width) =
                reconcile_children(pass, parent, offset, Vec::new(), out, env);
            (
                Instance::Component(ComponentInstance {
                    id,
                    type_id: comp.type_id,
                    name: comp.name,
                    props: comp.props,
                    render: comp.render,
                    hooks,
                    env: env.clone(),
                    rendered,
                    key: desc.key,
                }),
                width,
            )
        }
        Kind::Fragment => {
            let (children, width) =
                reconcile_children(pass, parent, offset, Vec::new(), desc.children, env);
            (
                Instance::Fragment(GroupInstance {
                    children,
                    key: desc.key,
                }),
                width,
            )
        }
        Kind::Provider { context, value } => {
            let child_env = env.with(context, value.clone());
            let (children, width) =
                reconcile_children(pass, parent, offset, Vec::new(), desc.children, &child_env);
            (
                Instance::Provider(ProviderInstance {
                    context,
                    value,
                    children,
                    key: desc.key,
                }),
                width,
            )
        }
    }
}

// =============================================================================
// Update In Place
// =============================================================================

fn update(
    pass: &Pass<'_>,
    parent: NodeId,
    offset: usize,
    instance: Instance,
    desc: Descriptor,
    env: &Env,
) -> (Instance, usize) {
    match (instance, desc.kind) {
        (Instance::Host(mut h), Kind::Host(_)) => {
            {
                let mut doc = pass.doc.borrow_mut();
                doc.place_child(parent, offset, h.node);
                diff_attrs(&mut doc, h.node, &h.attrs, &desc.attrs);
                // Closure identity is not comparable; rewrite unless both
                // renders had no listeners at all.
                if !(h.attrs.listeners.is_empty() && desc.attrs.listeners.is_empty()) {
                    doc.set_listeners(h.node, desc.attrs.listeners.clone());
                }
            }
            sync_node_ref(&h, &desc.attrs);

            let old_children = std::mem::take(&mut h.children);
            let (children, _) =
                reconcile_children(pass, h.node, 0, old_children, desc.children, env);
            h.children = children;
            h.attrs = desc.attrs;
            h.key = desc.key;
            (Instance::Host(h), 1)
        }
        (Instance::Text(mut t), Kind::Text(content)) => {
            let mut doc = pass.doc.borrow_mut();
            doc.place_child(parent, offset, t.node);
            if t.content != content {
                doc.set_text(t.node, &content);
                t.content = content;
            }
            t.key = desc.key;
            (Instance::Text(t), 1)
        }
        (Instance::Component(mut c), Kind::Component(comp)) => {
            c.props = comp.props;
            c.render = comp.render;
            c.env = env.clone();
            c.key = desc.key;

            let out = invoke(pass, &c.hooks, env, c.id, &c.render, c.props.as_ref());
            let old = std::mem::take(&mut c.rendered);
            let (rendered, width) = reconcile_children(pass, parent, offset, old, out, env);
            c.rendered = rendered;
            (Instance::Component(c), width)
        }
        (Instance::Provider(mut p), Kind::Provider { context, value }) => {
            p.value = value;
            p.key = desc.key;
            let child_env = env.with(context, p.value.clone());
            let old = std::mem::take(&mut p.children);
            let (children, width) =
                reconcile_children(pass, parent, offset, old, desc.children, &child_env);
            p.children = children;
            (Instance::Provider(p), width)
        }
        (Instance::Fragment(mut g), Kind::Fragment) => {
            g.key = desc.key;
            let old = std::mem::take(&mut g.children);
            let (children, width) =
                reconcile_children(pass, parent, offset, old, desc.children, env);
            g.children = children;
            (Instance::Fragment(g), width)
        }
        // matches() gated entry into update.
        _ => unreachable!("update called with mismatched instance/descriptor kinds"),
    }
}

/// Re-invoke a component function against its hook store.
pub(crate) fn invoke(
    pass: &Pass<'_>,
    hooks: &Rc<RefCell<HookStore>>,
    env: &Env,
    id: InstanceId,
    render: &Rc<dyn Fn(&mut Ctx, &dyn std::any::Any) -> crate::descriptor::Children>,
    props: &dyn std::any::Any,
) -> Vec<Descriptor> {
    hooks.borrow_mut().begin();
    let mut ctx = Ctx::new(hooks.clone(), env.clone(), id, pass.shared.clone());
    let out = render(&mut ctx, props);
    // This instance just rendered; drop any pending dirty mark for it.
    pass.shared.forget(id);
    out.0
}

/// Apply only the changed attributes and remove the absent ones.
fn diff_attrs(
    doc: &mut crate::dom::Document,
    node: NodeId,
    old: &Attrs,
    new: &Attrs,
) {
    for (name, value) in &new.values {
        if old.get(name) != Some(value) {
            doc.set_attribute(node, name.clone(), value.clone());
        }
    }
    for (name, _) in &old.values {
        if new.get(name).is_none() {
            doc.remove_attribute(node, name);
        }
    }
}

/// Keep node-ref cells in sync across an update.
fn sync_node_ref(h: &HostInstance, new_attrs: &Attrs) {
    match (&h.attrs.node_ref, &new_attrs.node_ref) {
        (Some(old), Some(new)) => {
            if !old.same(new) {
                old.set(None);
            }
            new.set(Some(h.node));
        }
        (Some(old), None) => old.set(None),
        (None, Some(new)) => new.set(Some(h.node)),
        (None, None) => {}
    }
}

// =============================================================================
// Dirty Subtree Re-render
// =============================================================================

/// Locate the dirty component in the live tree and re-render exactly its
/// subtree, using its stored props and environment snapshot.
///
/// Returns false when the instance no longer exists (unmounted after the
/// state update was scheduled).
pub(crate) fn rerender_dirty(
    pass: &Pass<'_>,
    roots: &mut Vec<Instance>,
    target: NodeId,
    id: InstanceId,
) -> bool {
    search(pass, roots, target, 0, id).found
}

struct Search {
    found: bool,
    /// Host-slot width of the searched list; only meaningful when not found.
    width: usize,
}

fn search(
    pass: &Pass<'_>,
    list: &mut [Instance],
    parent: NodeId,
    start: usize,
    id: InstanceId,
) -> Search {
    let mut offset = start;
    for instance in list.iter_mut() {
        match instance {
            Instance::Host(h) => {
                let node = h.node;
                let result = search(pass, &mut h.children, node, 0, id);
                if result.found {
                    return result;
                }
                offset += 1;
            }
            Instance::Text(_) => offset += 1,
            Instance::Fragment(g) => {
                let result = search(pass, &mut g.children, parent, offset, id);
                if result.found {
                    return result;
                }
                offset += result.width;
            }
            Instance::Provider(p) => {
                let result = search(pass, &mut p.children, parent, offset, id);
                if result.found {
                    return result;
                }
                offset += result.width;
            }
            Instance::Component(c) => {
                if c.id == id {
                    let env = c.env.clone();
                    let render = c.render.clone();
                    let props = c.props.clone();
                    let out = invoke(pass, &c.hooks, &env, c.id, &render, props.as_ref());
                    let old = std::mem::take(&mut c.rendered);
                    let (rendered, _) =
                        reconcile_children(pass, parent, offset, old, out, &env);
                    c.rendered = rendered;
                    return Search {
                        found: true,
                        width: 0,
                    };
                }
                let result = search(pass, &mut c.rendered, parent, offset, id);
                if result.found {
                    return result;
                }
                offset += result.width;
            }
        }
    }
    Search {
        found: false,
        width: offset - start,
    }
}
