//! Element descriptors - immutable descriptions of what to render.
//!
//! [`h`] builds a host-element descriptor from a tag, an attribute set and
//! children, hyperscript style. [`component`] wraps a component function
//! plus its props, [`fragment`] groups children without a host node.
//!
//! Descriptors are pure data: building one has no side effects, and a new
//! tree is built on every render. Children flatten per the hyperscript
//! rules - nested sequences inline, unit/`None`/bool children drop,
//! strings and numbers become text nodes.

use std::any::{Any, TypeId, type_name};
use std::rc::Rc;

use crate::context::ContextId;
use crate::hooks::Ctx;
use crate::types::{AttrValue, ElementRef, Event, EventCallback, EventKind, StyleMap};

// =============================================================================
// Descriptor
// =============================================================================

/// What kind of thing a tree position describes.
pub(crate) enum Kind {
    /// Host element with a tag name.
    Host(String),
    /// Text node.
    Text(String),
    /// Component invocation.
    Component(ComponentDesc),
    /// Transparent grouping; children splice into the parent.
    Fragment,
    /// Context provider; children see `value` for `context`.
    Provider {
        context: ContextId,
        value: Rc<dyn Any>,
    },
}

/// Type-erased component reference.
///
/// Identity is the `TypeId` of the render function's type: stable across
/// renders for the same source-level function, distinct between different
/// functions - the Rust analogue of matching JS function references.
pub(crate) struct ComponentDesc {
    pub type_id: TypeId,
    pub name: &'static str,
    pub props: Rc<dyn Any>,
    pub render: Rc<dyn Fn(&mut Ctx, &dyn Any) -> Children>,
}

impl Clone for ComponentDesc {
    fn clone(&self) -> Self {
        Self {
            type_id: self.type_id,
            name: self.name,
            props: self.props.clone(),
            render: self.render.clone(),
        }
    }
}

/// Immutable description of an element, component invocation, text node,
/// fragment or provider. Built fresh on every render; never mutated.
pub struct Descriptor {
    pub(crate) kind: Kind,
    pub(crate) attrs: Attrs,
    pub(crate) children: Vec<Descriptor>,
    pub(crate) key: Option<String>,
}

impl Descriptor {
    pub(crate) fn text(content: impl Into<String>) -> Self {
        Self {
            kind: Kind::Text(content.into()),
            attrs: Attrs::new(),
            children: Vec::new(),
            key: None,
        }
    }

    pub(crate) fn provider(context: ContextId, value: Rc<dyn Any>, children: Children) -> Self {
        Self {
            kind: Kind::Provider { context, value },
            attrs: Attrs::new(),
            children: children.0,
            key: None,
        }
    }

    /// Attach an explicit reconciliation key.
    ///
    /// Keyed children are matched by key before positional matching, so a
    /// reordered list keeps each child's instance (and hook state) with its
    /// logical item. Unkeyed children reconcile purely by position.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// Build a host-element descriptor: tag, attributes, children.
pub fn h(tag: impl Into<String>, attrs: Attrs, children: impl Into<Children>) -> Descriptor {
    Descriptor {
        kind: Kind::Host(tag.into()),
        attrs,
        children: children.into().0,
        key: None,
    }
}

/// Group children without introducing a host node.
pub fn fragment(children: impl Into<Children>) -> Descriptor {
    Descriptor {
        kind: Kind::Fragment,
        attrs: Attrs::new(),
        children: children.into().0,
        key: None,
    }
}

/// Describe a component invocation: a function plus its props.
///
/// The reconciler re-invokes `render` with the props of each pass, handing
/// it a [`Ctx`] bound to the instance's hook store.
pub fn component<P, F>(render: F, props: P) -> Descriptor
where
    P: 'static,
    F: Fn(&mut Ctx, &P) -> Children + 'static,
{
    let call = Rc::new(move |ctx: &mut Ctx, props: &dyn Any| {
        let props = props
            .downcast_ref::<P>()
            .expect("component invoked with mismatched props type");
        render(ctx, props)
    });
    Descriptor {
        kind: Kind::Component(ComponentDesc {
            type_id: TypeId::of::<F>(),
            name: type_name::<F>(),
            props: Rc::new(props),
            render: call,
        }),
        attrs: Attrs::new(),
        children: Vec::new(),
        key: None,
    }
}

// =============================================================================
// Attributes
// =============================================================================

/// Attribute set of a host element: values, event listeners and an
/// optional node ref. Built with chained calls:
///
/// ```ignore
/// h("button", Attrs::new().class("red").on_click(|_| {}), "Show alert")
/// ```
#[derive(Clone, Default)]
pub struct Attrs {
    pub(crate) values: Vec<(String, AttrValue)>,
    pub(crate) listeners: Vec<(EventKind, EventCallback)>,
    pub(crate) node_ref: Option<ElementRef>,
}

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a named attribute.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.values.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.values.push((name, value));
        }
        self
    }

    /// `class` attribute.
    pub fn class(self, value: impl Into<String>) -> Self {
        self.set("class", value.into())
    }

    /// `id` attribute.
    pub fn id(self, value: impl Into<String>) -> Self {
        self.set("id", value.into())
    }

    /// Inline style.
    pub fn style(self, style: impl Into<StyleMap>) -> Self {
        self.set("style", AttrValue::Style(style.into()))
    }

    /// Register a listener for an event kind.
    pub fn on(mut self, kind: EventKind, callback: impl Fn(&Event) + 'static) -> Self {
        self.listeners.push((kind, Rc::new(callback)));
        self
    }

    /// Click listener.
    pub fn on_click(self, callback: impl Fn(&Event) + 'static) -> Self {
        self.on(EventKind::Click, callback)
    }

    /// Input listener.
    pub fn on_input(self, callback: impl Fn(&Event) + 'static) -> Self {
        self.on(EventKind::Input, callback)
    }

    /// Receive the mounted node's handle in `r` (cleared on unmount).
    pub fn bind_ref(mut self, r: &ElementRef) -> Self {
        self.node_ref = Some(r.clone());
        self
    }

    pub(crate) fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

// =============================================================================
// Children
// =============================================================================

/// One child expression before flattening.
///
/// Conversions implement the hyperscript child rules: descriptors and
/// sequences nest, strings and numbers become text, `()`/`None`/bools
/// disappear.
pub enum Child {
    Node(Descriptor),
    Many(Vec<Child>),
    Text(String),
    Empty,
}

impl From<Descriptor> for Child {
    fn from(d: Descriptor) -> Self {
        Child::Node(d)
    }
}

impl From<&str> for Child {
    fn from(s: &str) -> Self {
        Child::Text(s.to_string())
    }
}

impl From<String> for Child {
    fn from(s: String) -> Self {
        Child::Text(s)
    }
}

impl From<i64> for Child {
    fn from(n: i64) -> Self {
        Child::Text(n.to_string())
    }
}

impl From<i32> for Child {
    fn from(n: i32) -> Self {
        Child::Text(n.to_string())
    }
}

impl From<f64> for Child {
    fn from(n: f64) -> Self {
        Child::Text(crate::types::format_number(n))
    }
}

impl From<bool> for Child {
    fn from(_: bool) -> Self {
        Child::Empty
    }
}

impl From<()> for Child {
    fn from(_: ()) -> Self {
        Child::Empty
    }
}

impl<C: Into<Child>> From<Option<C>> for Child {
    fn from(opt: Option<C>) -> Self {
        match opt {
            Some(c) => c.into(),
            None => Child::Empty,
        }
    }
}

impl From<Vec<Descriptor>> for Child {
    fn from(list: Vec<Descriptor>) -> Self {
        Child::Many(list.into_iter().map(Child::Node).collect())
    }
}

impl From<Vec<Child>> for Child {
    fn from(list: Vec<Child>) -> Self {
        Child::Many(list)
    }
}

impl From<Children> for Child {
    fn from(children: Children) -> Self {
        Child::Many(children.0.into_iter().map(Child::Node).collect())
    }
}

/// Flattened, ready-to-reconcile child list.
///
/// Also the return type of component functions: return `Children::new()`
/// (or `().into()`) to render nothing.
#[derive(Default)]
pub struct Children(pub(crate) Vec<Descriptor>);

impl Children {
    /// Empty child list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten a sequence of child expressions.
    pub fn from_children(list: Vec<Child>) -> Self {
        let mut out = Vec::new();
        flatten_into(list, &mut out);
        Children(out)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn flatten_into(list: Vec<Child>, out: &mut Vec<Descriptor>) {
    for child in list {
        match child {
            Child::Node(d) => out.push(d),
            Child::Text(s) => out.push(Descriptor::text(s)),
            Child::Many(nested) => flatten_into(nested, out),
            Child::Empty => {}
        }
    }
}

impl From<()> for Children {
    fn from(_: ()) -> Self {
        Children::new()
    }
}

impl From<Descriptor> for Children {
    fn from(d: Descriptor) -> Self {
        Children(vec![d])
    }
}

impl From<Vec<Descriptor>> for Children {
    fn from(list: Vec<Descriptor>) -> Self {
        Children(list)
    }
}

impl From<&str> for Children {
    fn from(s: &str) -> Self {
        Children(vec![Descriptor::text(s)])
    }
}

impl From<String> for Children {
    fn from(s: String) -> Self {
        Children(vec![Descriptor::text(s)])
    }
}

impl From<Child> for Children {
    fn from(child: Child) -> Self {
        Children::from_children(vec![child])
    }
}

/// Build a [`Children`] list from mixed child expressions:
///
/// ```ignore
/// children![
///     h("h1", Attrs::new().class("red"), "hooked hyperscript"),
///     "plain text",
///     count,                     // numbers become text
///     maybe_descriptor,          // Option<_> drops None
/// ]
/// ```
#[macro_export]
macro_rules! children {
    () => { $crate::descriptor::Children::new() };
    ($($child:expr),+ $(,)?) => {
        $crate::descriptor::Children::from_children(
            vec![$($crate::descriptor::Child::from($child)),+]
        )
    };
}

// =============================================================================
// Tests
// =============================================================================
